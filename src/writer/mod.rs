//! Writing the hashed tree.
//!
//! Every finalized document becomes one independent write job, run on the
//! blocking pool with at most `max_parallel` jobs in flight. Within a job the
//! order is fixed: the hashed output (and its source map) is written first and
//! the original is deleted only after that write succeeded. A failing job is
//! recorded in the [`WriteReport`] and never stops the others; nothing already
//! written is rolled back.
//!
//! In place, originals that were renamed are deleted, except those a reference
//! left unresolved by cycle breaking still needs: the stale target and every
//! original it reaches through its own references. With an output directory,
//! nothing under the root is touched and files that keep their name, including
//! those no plugin would parse, are copied across unchanged.

use crate::core::CachebustError;
use crate::document::DependencyStatus;
use crate::graph::AssetGraph;
use crate::pipeline::Context;
use crate::utils::fs::FileSystem;
use crate::utils::paths::relative_to_root;
use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A file operation that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Relative path of the document the operation belonged to, if any
    pub document: Option<String>,
    /// Path the operation was applied to
    pub path: PathBuf,
    /// Error message, including its cause
    pub message: String,
}

/// Outcome of the write stage.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Files written (hashed outputs and their source maps)
    pub written: Vec<PathBuf>,
    /// Files copied unchanged into the output directory
    pub copied: Vec<PathBuf>,
    /// Originals deleted after their replacement was written
    pub removed: Vec<PathBuf>,
    /// Operations that failed
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    /// Whether every operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Relative paths of documents with at least one failed operation.
    #[must_use]
    pub fn failed_documents(&self) -> HashSet<String> {
        self.failures.iter().filter_map(|f| f.document.clone()).collect()
    }

    fn merge(&mut self, other: Self) {
        self.written.extend(other.written);
        self.copied.extend(other.copied);
        self.removed.extend(other.removed);
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, document: Option<&str>, path: PathBuf, error: &CachebustError) {
        let message = match std::error::Error::source(error) {
            Some(source) => format!("{error}: {source}"),
            None => error.to_string(),
        };
        tracing::error!("{}", message);
        self.failures.push(WriteFailure {
            document: document.map(str::to_string),
            path,
            message,
        });
    }
}

/// One independent unit of output work.
#[derive(Debug)]
enum WriteJob {
    Document {
        relative: String,
        source: PathBuf,
        output: PathBuf,
        contents: Vec<u8>,
        write: bool,
        remove_original: bool,
        source_map: Option<(PathBuf, PathBuf)>,
    },
    Copy {
        source: PathBuf,
        output: PathBuf,
    },
}

/// Writes a finalized graph through the run's file system.
pub struct Writer<'a> {
    ctx: &'a Context,
}

impl<'a> Writer<'a> {
    /// Create a writer for the given run context.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
        }
    }

    /// Write every finalized document; copy `skipped` files when writing to an output directory.
    pub async fn write(&self, graph: &AssetGraph, skipped: &[PathBuf]) -> WriteReport {
        let jobs = self.plan(graph, skipped);
        tracing::info!("Writing {} file(s) to {}", jobs.len(), self.ctx.config.output_root().display());

        let outcomes: Vec<WriteReport> = stream::iter(jobs)
            .map(|job| {
                let fs = self.ctx.fs.clone();
                async move {
                    let label = job.label();
                    let document = job.document().map(str::to_string);
                    match tokio::task::spawn_blocking(move || run_job(fs.as_ref(), job)).await {
                        Ok(report) => report,
                        Err(e) => {
                            let mut report = WriteReport::default();
                            report.fail(
                                document.as_deref(),
                                label.clone(),
                                &CachebustError::io("write", &label, std::io::Error::other(e.to_string())),
                            );
                            report
                        }
                    }
                }
            })
            .buffer_unordered(self.ctx.config.max_parallel)
            .collect()
            .await;

        let mut report = WriteReport::default();
        for outcome in outcomes {
            report.merge(outcome);
        }
        report.written.sort();
        report.copied.sort();
        report.removed.sort();
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));
        report
    }

    fn plan(&self, graph: &AssetGraph, skipped: &[PathBuf]) -> Vec<WriteJob> {
        let config = &self.ctx.config;
        let in_place = config.in_place();
        let outputs: HashSet<&PathBuf> = graph.documents().filter_map(|d| d.output_path.as_ref()).collect();
        let retained = if in_place { stale_targets(graph) } else { HashSet::new() };
        let mut passengers: HashSet<&PathBuf> = HashSet::new();
        let mut jobs = Vec::new();

        for document in graph.documents() {
            let Some(output) = document.output_path.clone() else {
                continue;
            };
            let renamed = output != document.file_path;
            let keep = retained.contains(&document.file_path);
            if keep && renamed {
                tracing::debug!("Keeping {}: a cycle reference still points at it", document.relative_path);
            }
            let source_map = document.source_map.as_ref().and_then(|map| {
                passengers.insert(&map.path);
                document.source_map_output().map(|out| (map.path.clone(), out))
            });

            jobs.push(WriteJob::Document {
                relative: document.relative_path.clone(),
                source: document.file_path.clone(),
                output,
                contents: document.contents.clone(),
                write: !in_place || renamed,
                remove_original: in_place && renamed && !keep && !outputs.contains(&document.file_path),
                source_map: source_map.filter(|(from, to)| !in_place || from != to),
            });
        }

        if !in_place {
            for path in skipped {
                if passengers.contains(path) {
                    continue;
                }
                if let Some(relative) = relative_to_root(&config.root, path) {
                    jobs.push(WriteJob::Copy {
                        source: path.clone(),
                        output: config.output_root().join(relative),
                    });
                }
            }
        }

        jobs
    }
}

/// Originals still referenced after cycle breaking, closed over their own references.
fn stale_targets(graph: &AssetGraph) -> HashSet<&PathBuf> {
    let mut stack: Vec<_> = graph
        .documents()
        .flat_map(|document| &document.dependencies)
        .filter(|dependency| dependency.status == DependencyStatus::UnresolvedDueToCycle)
        .filter_map(|dependency| dependency.file_path.as_deref())
        .filter_map(|path| graph.node(path))
        .collect();

    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if seen.insert(node) {
            stack.extend(graph.dependencies_of(node));
        }
    }
    seen.into_iter().map(|node| &graph.document(node).file_path).collect()
}

impl WriteJob {
    /// Relative path of the document this job writes, if any.
    fn document(&self) -> Option<&str> {
        match self {
            Self::Document {
                relative,
                ..
            } => Some(relative),
            Self::Copy {
                ..
            } => None,
        }
    }

    fn label(&self) -> PathBuf {
        match self {
            Self::Document {
                output,
                ..
            }
            | Self::Copy {
                output,
                ..
            } => output.clone(),
        }
    }
}

fn run_job(fs: &dyn FileSystem, job: WriteJob) -> WriteReport {
    let mut report = WriteReport::default();

    match job {
        WriteJob::Document {
            relative,
            source,
            output,
            contents,
            write,
            remove_original,
            source_map,
        } => {
            let document = Some(relative.as_str());

            if write {
                if let Err(e) = fs.write(&output, &contents) {
                    report.fail(document, output, &e);
                    return report;
                }
                tracing::debug!("Wrote {}", output.display());
                report.written.push(output);
            }

            if let Some((map_source, map_output)) = source_map {
                match fs.read(&map_source).and_then(|bytes| fs.write(&map_output, &bytes)) {
                    Ok(()) => {
                        report.written.push(map_output);
                        if remove_original {
                            remove(fs, &map_source, document, &mut report);
                        }
                    }
                    Err(e) => {
                        report.fail(document, map_output, &e);
                        return report;
                    }
                }
            }

            if remove_original {
                remove(fs, &source, document, &mut report);
            }
        }
        WriteJob::Copy {
            source,
            output,
        } => match fs.read(&source).and_then(|bytes| fs.write(&output, &bytes)) {
            Ok(()) => report.copied.push(output),
            Err(e) => report.fail(None, output, &e),
        },
    }

    report
}

/// Delete an original; one already gone (a map shared by two documents) is not an error.
fn remove(fs: &dyn FileSystem, path: &Path, document: Option<&str>, report: &mut WriteReport) {
    match fs.remove(path) {
        Ok(()) => {
            tracing::debug!("Removed {}", path.display());
            report.removed.push(path.to_path_buf());
        }
        Err(CachebustError::Io {
            source,
            ..
        }) if source.kind() == ErrorKind::NotFound => {}
        Err(e) => report.fail(document, path.to_path_buf(), &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::graph::GraphBuilder;
    use crate::hasher::TopologicalHasher;
    use crate::test_utils::FaultyFileSystem;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    async fn hash_and_write(ctx: &Context) -> (AssetGraph, WriteReport) {
        let mut build = GraphBuilder::new(ctx).build().await.unwrap();
        TopologicalHasher::new(&ctx.config).hash(&mut build.graph).unwrap();
        let report = Writer::new(ctx).write(&build.graph, &build.skipped).await;
        (build.graph, report)
    }

    #[tokio::test]
    async fn test_in_place_write_then_delete() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "index.html", r#"<script src="app.js"></script>"#);
        write(root, "app.js", "x();\n//# sourceMappingURL=app.js.map\n");
        write(root, "app.js.map", "{\"version\":3}");
        write(root, "robots.txt", "User-agent: *");

        let ctx = Context::local(Config::new(root)).unwrap();
        let (graph, report) = hash_and_write(&ctx).await;
        assert!(report.is_success(), "{:?}", report.failures);

        let app = graph.get(&root.join("app.js")).unwrap();
        let app_out = app.output_path.clone().unwrap();
        assert!(app_out.is_file());
        assert!(!root.join("app.js").exists());
        assert!(!root.join("app.js.map").exists());
        assert_eq!(std::fs::read_to_string(app.source_map_output().unwrap()).unwrap(), "{\"version\":3}");
        assert!(root.join("robots.txt").is_file());
        assert!(!root.join("index.html").exists());
        assert_eq!(report.removed.len(), 3);
    }

    #[tokio::test]
    async fn test_out_dir_leaves_root_untouched() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("site");
        let out = temp.path().join("dist");
        write(&root, "css/site.css", "a{background:url(../img/a.png)}");
        write(&root, "img/a.png", "A");
        write(&root, "robots.txt", "r");
        write(&root, "orphan.js.map", "{}");

        let ctx = Context::local(Config::new(&root).with_out_dir(&out)).unwrap();
        let (graph, report) = hash_and_write(&ctx).await;
        assert!(report.is_success());
        assert!(report.removed.is_empty());

        assert!(root.join("css/site.css").is_file());
        assert!(root.join("img/a.png").is_file());
        assert_eq!(std::fs::read_to_string(out.join("robots.txt")).unwrap(), "r");
        assert!(out.join("orphan.js.map").is_file());
        let css_out = graph.get(&root.join("css/site.css")).unwrap().output_path.clone().unwrap();
        assert!(css_out.starts_with(out.join("css")));
        assert!(css_out.is_file());
    }

    #[tokio::test]
    async fn test_cycle_targets_are_kept_in_place() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "a.css", "@import \"b.css\";");
        write(root, "b.css", "@import \"a.css\";");
        write(root, "c.css", "p{}");

        let ctx = Context::local(Config::new(root)).unwrap();
        let (graph, report) = hash_and_write(&ctx).await;
        assert!(report.is_success());

        assert_eq!(report.removed, vec![root.join("c.css")]);
        assert!(root.join("a.css").is_file());
        assert!(root.join("b.css").is_file());
        for document in graph.documents() {
            assert!(document.output_path.as_ref().unwrap().is_file());
        }
    }

    #[tokio::test]
    async fn test_failed_write_keeps_original_and_continues() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "locked/a.js", "a");
        write(root, "b.js", "b");

        let fs = Arc::new(FaultyFileSystem::new().deny_write(root.join("locked")));
        let plugins = Arc::new(crate::plugins::PluginRegistry::with_defaults().unwrap());
        let ctx = Context::new(Config::new(root), fs.clone(), plugins);
        let (_, report) = hash_and_write(&ctx).await;

        assert!(!report.is_success());
        assert_eq!(report.failed_documents(), HashSet::from(["locked/a.js".to_string()]));
        assert!(root.join("locked/a.js").is_file());
        assert!(!root.join("b.js").exists());
        assert_eq!(fs.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_panicked_write_is_attributed_to_its_document() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "crash/a.js", "a");
        write(root, "b.js", "b");

        let fs = Arc::new(FaultyFileSystem::new().panic_on_write(root.join("crash")));
        let plugins = Arc::new(crate::plugins::PluginRegistry::with_defaults().unwrap());
        let ctx = Context::new(Config::new(root), fs, plugins);
        let (_, report) = hash_and_write(&ctx).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failed_documents(), HashSet::from(["crash/a.js".to_string()]));
        assert!(root.join("crash/a.js").is_file());
    }
}
