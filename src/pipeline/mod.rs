//! End-to-end run orchestration.
//!
//! [`Context`] carries the collaborators every stage needs (configuration,
//! file system, plugin registry) and is passed explicitly; no stage reaches
//! for global state. [`run`] wires the stages together:
//!
//! 1. validate the configuration
//! 2. enumerate, parse and resolve ([`GraphBuilder`])
//! 3. hash and rewrite in dependency order ([`TopologicalHasher`])
//! 4. optionally dump the document registry
//! 5. write outputs, delete renamed originals and save the manifest ([`Writer`])
//!
//! Steps 2 and 3 either succeed completely or abort the run before anything is
//! written, except for unreadable files, which are left out of the graph and
//! reported. Step 5 never aborts; its failures are returned in the report.

use crate::config::Config;
use crate::core::CachebustError;
use crate::document::{Dependency, Document, DocumentOrigin};
use crate::graph::{AssetGraph, GraphBuilder, ReadFailure};
use crate::hasher::TopologicalHasher;
use crate::manifest::{CycleDiagnostic, Manifest};
use crate::plugins::PluginRegistry;
use crate::utils::fs::{FileSystem, LocalFileSystem};
use crate::utils::paths::to_storage;
use crate::writer::{WriteFailure, WriteReport, Writer};
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Collaborators shared by every stage of one run.
#[derive(Clone)]
pub struct Context {
    /// Validated run configuration
    pub config: Arc<Config>,
    /// File system used for every read, write and delete
    pub fs: Arc<dyn FileSystem>,
    /// Ordered plugin registry
    pub plugins: Arc<PluginRegistry>,
}

impl Context {
    /// Assemble a context from explicit collaborators.
    #[must_use]
    pub fn new(config: Config, fs: Arc<dyn FileSystem>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            fs,
            plugins,
        }
    }

    /// Context on the local disk with the built-in plugins.
    pub fn local(config: Config) -> Result<Self, CachebustError> {
        let plugins = PluginRegistry::with_defaults()?;
        Ok(Self::new(config, Arc::new(LocalFileSystem::new()), Arc::new(plugins)))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Documents in the graph
    pub documents: usize,
    /// Documents that received a content hash
    pub hashed: usize,
    /// Manifest as written (or as planned in a dry run)
    pub manifest: Manifest,
    /// Files that could not be read and were left out
    pub unreadable: Vec<ReadFailure>,
    /// Write stage outcome; `None` in a dry run
    pub write: Option<WriteReport>,
}

impl RunReport {
    /// Whether every file was read and written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.unreadable.is_empty() && self.write.as_ref().is_none_or(WriteReport::is_success)
    }

    /// Messages of every failed read, write or delete.
    #[must_use]
    pub fn failure_messages(&self) -> Vec<String> {
        let reads = self.unreadable.iter().map(|f| f.message.clone());
        let writes = self.write.iter().flat_map(|w| w.failures.iter().map(|f| f.message.clone()));
        reads.chain(writes).collect()
    }

    /// Stale references left by cycle breaking.
    #[must_use]
    pub fn diagnostics(&self) -> &[CycleDiagnostic] {
        &self.manifest.diagnostics
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!("Hashed {} of {} documents", self.hashed, self.documents);
        match &self.write {
            Some(write) => {
                summary.push_str(&format!(
                    ", wrote {} file(s), copied {}, removed {}",
                    write.written.len(),
                    write.copied.len(),
                    write.removed.len()
                ));
            }
            None => summary.push_str(" (dry run, nothing written)"),
        }
        if !self.manifest.diagnostics.is_empty() {
            summary.push_str(&format!(", {} reference(s) left stale by cycles", self.manifest.diagnostics.len()));
        }
        let failures = self.failure_messages().len();
        if failures > 0 {
            summary.push_str(&format!(", {failures} failure(s)"));
        }
        summary
    }
}

/// Run the whole pipeline for `ctx`.
pub async fn run(ctx: &Context) -> Result<RunReport> {
    let config = &ctx.config;
    config.validate()?;
    tracing::info!(
        "Processing {} (hash length {}, {})",
        config.root.display(),
        config.hash_length,
        if config.in_place() {
            "in place".to_string()
        } else {
            format!("output to {}", config.output_root().display())
        }
    );

    let build = GraphBuilder::new(ctx).build().await?;
    let mut graph = build.graph;

    let hash_report = TopologicalHasher::new(config)
        .hash(&mut graph)
        .with_context(|| format!("Failed to hash documents under {}", config.root.display()))?;
    if hash_report.cycle_breaks > 0 {
        tracing::warn!(
            "Broke {} dependency cycle(s); {} reference(s) keep their original names",
            hash_report.cycle_breaks,
            hash_report.diagnostics.len()
        );
    }

    if let Some(dump) = &config.registry_dump {
        dump_registry(ctx, &graph, dump)?;
    }

    let documents = graph.len();
    let hashed = hash_report.hashed;

    if config.dry_run {
        let manifest = Manifest::from_graph(&graph, config, &hash_report.diagnostics, &HashSet::new());
        tracing::info!("Dry run: {} manifest entries planned", manifest.len());
        return Ok(RunReport {
            documents,
            hashed,
            manifest,
            unreadable: build.unreadable,
            write: None,
        });
    }

    let mut write = Writer::new(ctx).write(&graph, &build.skipped).await;
    let manifest = Manifest::from_graph(&graph, config, &hash_report.diagnostics, &write.failed_documents());

    let manifest_path = config.manifest_path();
    if let Err(e) = manifest.save(ctx.fs.as_ref(), &manifest_path) {
        tracing::error!("{}", e);
        write.failures.push(WriteFailure {
            document: None,
            path: manifest_path,
            message: e.to_string(),
        });
    }

    Ok(RunReport {
        documents,
        hashed,
        manifest,
        unreadable: build.unreadable,
        write: Some(write),
    })
}

/// One document as recorded in the registry dump.
#[derive(Debug, Serialize)]
struct RegistryEntry<'a> {
    path: &'a str,
    origin: DocumentOrigin,
    content_hash: Option<&'a str>,
    output_path: Option<String>,
    source_map: Option<String>,
    dependencies: Vec<RegistryDependency<'a>>,
}

#[derive(Debug, Serialize)]
struct RegistryDependency<'a> {
    specifier: &'a str,
    target: Option<String>,
    start: usize,
    end: usize,
    status: &'static str,
}

impl<'a> RegistryEntry<'a> {
    fn new(document: &'a Document, root: &Path) -> Self {
        let display = |path: &Path| to_storage(path.strip_prefix(root).unwrap_or(path));
        Self {
            path: &document.relative_path,
            origin: document.origin,
            content_hash: document.content_hash.as_deref(),
            output_path: document.output_path.as_deref().map(to_storage),
            source_map: document.source_map.as_ref().map(|map| display(&map.path)),
            dependencies: document
                .dependencies
                .iter()
                .map(|dependency: &'a Dependency| RegistryDependency {
                    specifier: &dependency.specifier,
                    target: dependency.file_path.as_deref().map(display),
                    start: dependency.position.start,
                    end: dependency.position.end,
                    status: dependency.status.as_str(),
                })
                .collect(),
        }
    }
}

/// Write every document of `graph` as JSON to `path`. Runs in dry runs too.
fn dump_registry(ctx: &Context, graph: &AssetGraph, path: &Path) -> Result<()> {
    let entries: Vec<RegistryEntry<'_>> =
        graph.documents().map(|document| RegistryEntry::new(document, &ctx.config.root)).collect();
    let mut json = serde_json::to_string_pretty(&entries).context("Failed to serialize registry dump")?;
    json.push('\n');
    ctx.fs
        .write(path, json.as_bytes())
        .with_context(|| format!("Failed to write registry dump to {}", path.display()))?;
    tracing::info!("Dumped {} document(s) to {}", entries.len(), path.display());
    Ok(())
}
