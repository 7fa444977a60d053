//! Parallel graph construction.
//!
//! Enumerates the build root, reads and parses every file with bounded
//! parallelism, resolves the references each plugin found and assembles the
//! [`AssetGraph`]. Any resolution failure aborts the build: a partial graph is
//! never handed to the hasher. A file that cannot be read is recorded in
//! [`GraphBuild::unreadable`] and left out; a document referencing it still
//! fails as a graph inconsistency.

use super::AssetGraph;
use crate::core::CachebustError;
use crate::document::{Dependency, Document, DocumentOrigin, SourceMapRef};
use crate::pipeline::Context;
use crate::plugins::ParsedAsset;
use crate::resolver::{Resolution, ResolveOptions, Resolver};
use crate::utils::paths::relative_to_root;
use anyhow::{Context as _, Result};
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};

/// Result of graph construction.
#[derive(Debug, Default)]
pub struct GraphBuild {
    /// Every document, connected.
    pub graph: AssetGraph,
    /// Files a plugin chose to skip; they are never renamed.
    pub skipped: Vec<PathBuf>,
    /// Files that could not be read.
    pub unreadable: Vec<ReadFailure>,
}

/// A file left out of the graph because reading it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    /// Root-relative path
    pub relative: String,
    /// Absolute path
    pub path: PathBuf,
    /// Error message, including its cause
    pub message: String,
}

/// Outcome of reading one file.
enum FileOutcome {
    Document(Box<Document>),
    Skipped(PathBuf),
    Unreadable(ReadFailure),
}

/// Builds the [`AssetGraph`] for the root of a [`Context`].
pub struct GraphBuilder<'a> {
    ctx: &'a Context,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder for the given run context.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
        }
    }

    /// Enumerate, read, parse and resolve every file under the root.
    pub async fn build(&self) -> Result<GraphBuild> {
        let root = self.ctx.config.root.clone();
        let files = self.enumerate(&root).await?;
        tracing::info!("Found {} files under {}", files.len(), root.display());

        let outcomes: Vec<Result<FileOutcome>> = stream::iter(files)
            .map(|path| {
                let ctx = self.ctx.clone();
                async move {
                    let display = path.display().to_string();
                    tokio::task::spawn_blocking(move || load_file(&ctx, &path))
                        .await
                        .with_context(|| format!("Parser task for {display} panicked"))?
                }
            })
            .buffered(self.ctx.config.max_parallel)
            .collect()
            .await;

        let mut build = GraphBuild::default();
        for outcome in outcomes {
            match outcome? {
                FileOutcome::Document(document) => {
                    build.graph.add_document(*document);
                }
                FileOutcome::Skipped(path) => build.skipped.push(path),
                FileOutcome::Unreadable(failure) => build.unreadable.push(failure),
            }
        }
        build.unreadable.sort_by(|a, b| a.relative.cmp(&b.relative));

        build.graph.connect()?;
        tracing::info!(
            "Built graph: {} documents, {} references, {} skipped, {} unreadable",
            build.graph.len(),
            build.graph.edge_count(),
            build.skipped.len(),
            build.unreadable.len()
        );

        Ok(build)
    }

    async fn enumerate(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let fs = self.ctx.fs.clone();
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || fs.list_files(&walk_root))
            .await
            .context("File enumeration task panicked")??;

        Ok(files
            .into_iter()
            .filter(|path| match relative_to_root(root, path) {
                Some(relative) if self.ctx.config.is_excluded(&relative) => {
                    tracing::debug!("Excluded {}", relative);
                    false
                }
                Some(_) => true,
                None => false,
            })
            .collect())
    }
}

/// Read one file and turn it into a document (or a skip).
fn load_file(ctx: &Context, path: &Path) -> Result<FileOutcome> {
    let root = &ctx.config.root;
    let relative = relative_to_root(root, path)
        .with_context(|| format!("{} is not under {}", path.display(), root.display()))?;
    let contents = match ctx.fs.read(path) {
        Ok(contents) => contents,
        Err(e) => {
            let message = match std::error::Error::source(&e) {
                Some(source) => format!("{e}: {source}"),
                None => e.to_string(),
            };
            tracing::error!("{}", message);
            return Ok(FileOutcome::Unreadable(ReadFailure {
                relative,
                path: path.to_path_buf(),
                message,
            }));
        }
    };

    let Some(plugin) = ctx.plugins.find(path) else {
        tracing::trace!("No plugin for {}; passing through", relative);
        return Ok(FileOutcome::Document(Box::new(Document::pass_through(path.to_path_buf(), relative, contents))));
    };

    let Some(asset) = plugin.parse(path, &contents)? else {
        tracing::debug!("Plugin '{}' skipped {}", plugin.name(), relative);
        return Ok(FileOutcome::Skipped(path.to_path_buf()));
    };

    let resolver = Resolver::new(root, ctx.fs.as_ref());
    let from_dir = path.parent().unwrap_or(root);
    let (dependencies, source_map) = resolve_asset(&resolver, &asset, from_dir, path, plugin.resolve_options())
        .with_context(|| format!("Failed to resolve references in {relative}"))?;

    tracing::debug!(
        "Parsed {} with '{}': {} references ({} internal)",
        relative,
        plugin.name(),
        dependencies.len(),
        dependencies.iter().filter(|d| d.is_internal()).count()
    );

    let document = Document::new(path.to_path_buf(), relative, contents, DocumentOrigin::Parsed(plugin.name()))
        .with_dependencies(dependencies)
        .with_source_map(source_map);
    Ok(FileOutcome::Document(Box::new(document)))
}

fn resolve_asset(
    resolver: &Resolver<'_>,
    asset: &ParsedAsset,
    from_dir: &Path,
    path: &Path,
    options: &ResolveOptions,
) -> Result<(Vec<Dependency>, Option<SourceMapRef>), CachebustError> {
    let mut dependencies = Vec::with_capacity(asset.references.len());
    for reference in &asset.references {
        let dependency = match resolver.resolve(&reference.specifier, from_dir, options)? {
            Resolution::File { path, suffix } => {
                Dependency::internal(reference.specifier.clone(), path, suffix, reference.position)
            }
            Resolution::External => Dependency::external(reference.specifier.clone(), reference.position),
        };
        dependencies.push(dependency);
    }

    let source_map = asset.source_map.as_ref().and_then(|reference| {
        match resolver.resolve(&reference.specifier, from_dir, &ResolveOptions::new()) {
            Ok(Resolution::File { path: map, suffix }) if map != path => Some(SourceMapRef {
                path: map,
                position: reference.position,
                suffix,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring source map of {}: {}", path.display(), e);
                None
            }
        }
    });

    Ok((dependencies, source_map))
}
