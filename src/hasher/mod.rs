//! Topological hashing.
//!
//! A document's hash covers its contents *after* every in-tree reference has
//! been rewritten to the target's hashed name, so targets must be finalized
//! before the documents that reference them. [`TopologicalHasher`] walks the
//! [`AssetGraph`] in waves:
//!
//! 1. every unfinalized document whose targets are all final is ready
//! 2. ready documents are finalized in relative-path order: rewrite, hash, name
//! 3. finalizing a document unblocks its dependents for the next wave
//!
//! When nothing is ready but documents remain, they sit on a cycle. The hasher
//! picks one document from a strongly connected component that depends on
//! nothing else outstanding, preferring the fewest pending targets and then the
//! smallest relative path, and finalizes it with its references to unfinished
//! targets left as authored. Each such reference is marked
//! [`DependencyStatus::UnresolvedDueToCycle`] and reported as a
//! [`CycleDiagnostic`].
//!
//! Parsed documents are always hashed. Pass-through documents are hashed only
//! when another document references them; otherwise they keep their name.

pub mod digest;
pub mod naming;

pub use digest::content_hash;
pub use naming::{hashed_file_name, source_map_name};

use crate::config::Config;
use crate::core::CachebustError;
use crate::document::DependencyStatus;
use crate::graph::AssetGraph;
use crate::manifest::{CycleDiagnostic, qualify};
use crate::resolver::specifier::{percent_decode, percent_encode, split_suffix};
use crate::rewriter::{Replacement, rewrite};
use crate::utils::paths::{relative_path, relative_to_root};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::Path;

/// Outcome of a hashing pass.
#[derive(Debug, Clone, Default)]
pub struct HashReport {
    /// Documents finalized (all of them, on success)
    pub finalized: usize,
    /// Documents that received a content hash
    pub hashed: usize,
    /// Cycle breaks performed
    pub cycle_breaks: usize,
    /// References left stale by cycle breaking
    pub diagnostics: Vec<CycleDiagnostic>,
}

/// Finalizes every document of a graph in dependency order.
pub struct TopologicalHasher<'a> {
    config: &'a Config,
}

impl<'a> TopologicalHasher<'a> {
    /// Create a hasher using the hash length, base URL and output root of `config`.
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self {
            config,
        }
    }

    /// Finalize every document in `graph`.
    pub fn hash(&self, graph: &mut AssetGraph) -> Result<HashReport, CachebustError> {
        let mut report = HashReport::default();
        let nodes = graph.nodes_by_path();
        let mut pending: HashMap<NodeIndex, usize> =
            nodes.iter().map(|&node| (node, graph.dependencies_of(node).count())).collect();
        let mut remaining = nodes.len();
        let mut ready: Vec<NodeIndex> = nodes.iter().copied().filter(|node| pending[node] == 0).collect();

        while remaining > 0 {
            if ready.is_empty() {
                let Some(node) = self.cycle_breaker(graph, &pending) else {
                    break;
                };
                tracing::warn!(
                    "Dependency cycle: finalizing {} with {} reference(s) left unresolved",
                    graph.document(node).relative_path,
                    pending.get(&node).copied().unwrap_or_default()
                );
                report.cycle_breaks += 1;
                ready.push(node);
            }

            for node in std::mem::take(&mut ready) {
                self.finalize(graph, node, &mut report)?;
                remaining -= 1;

                let dependents: Vec<NodeIndex> = graph.dependents_of(node).collect();
                for dependent in dependents {
                    if graph.document(dependent).is_final() {
                        continue;
                    }
                    if let Some(count) = pending.get_mut(&dependent) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            ready.push(dependent);
                        }
                    }
                }
            }

            ready.sort_by(|a, b| graph.document(*a).relative_path.cmp(&graph.document(*b).relative_path));
        }

        tracing::info!(
            "Hashed {} of {} documents ({} cycle break(s))",
            report.hashed,
            report.finalized,
            report.cycle_breaks
        );
        Ok(report)
    }

    /// Pick the document to finalize early when every remaining document waits on another.
    ///
    /// Only members of sink components of the unfinalized subgraph qualify, so a
    /// document that merely depends on a cycle never carries the stale reference.
    fn cycle_breaker(&self, graph: &AssetGraph, pending: &HashMap<NodeIndex, usize>) -> Option<NodeIndex> {
        let open: Vec<NodeIndex> =
            graph.nodes_by_path().into_iter().filter(|node| !graph.document(*node).is_final()).collect();

        let mut subgraph: DiGraph<NodeIndex, ()> = DiGraph::new();
        let local: HashMap<NodeIndex, NodeIndex> = open.iter().map(|&node| (node, subgraph.add_node(node))).collect();
        for &node in &open {
            for target in graph.dependencies_of(node) {
                if let Some(&to) = local.get(&target) {
                    subgraph.add_edge(local[&node], to, ());
                }
            }
        }

        let components = tarjan_scc(&subgraph);
        let mut component_of = vec![0; subgraph.node_count()];
        for (id, component) in components.iter().enumerate() {
            for member in component {
                component_of[member.index()] = id;
            }
        }

        let candidates = components.iter().enumerate().filter(|(id, component)| {
            component.iter().all(|member| subgraph.neighbors(*member).all(|next| component_of[next.index()] == *id))
        });

        candidates
            .flat_map(|(_, component)| component.iter().map(|member| subgraph[*member]))
            .min_by_key(|node| {
                (pending.get(node).copied().unwrap_or_default(), graph.document(*node).relative_path.clone())
            })
            .or_else(|| open.first().copied())
    }

    /// Rewrite, hash and name one document.
    fn finalize(&self, graph: &mut AssetGraph, node: NodeIndex, report: &mut HashReport) -> Result<(), CachebustError> {
        let document = graph.document(node);
        let relative = Path::new(&document.relative_path);
        let output_dir = self.config.output_root().join(relative.parent().unwrap_or_else(|| Path::new("")));

        let mut replacements = Vec::new();
        let mut statuses = Vec::new();
        let mut diagnostics = Vec::new();

        for (index, dependency) in document.dependencies.iter().enumerate() {
            let Some(target_path) = dependency.file_path.as_deref() else {
                continue;
            };
            let target = graph.node(target_path).ok_or_else(|| CachebustError::GraphInconsistency {
                document: document.relative_path.clone(),
                dependency: dependency.specifier.clone(),
                target: target_path.display().to_string(),
            })?;
            let target = graph.document(target);

            match target.output_path.as_deref() {
                Some(output) => {
                    let text =
                        format!("{}{}", self.reference(&output_dir, output, &dependency.specifier), dependency.suffix);
                    replacements.push(Replacement::new(dependency.position, text));
                    statuses.push((index, DependencyStatus::Rewritten));
                }
                None => {
                    tracing::warn!(
                        "Leaving '{}' in {} unresolved to break a dependency cycle",
                        dependency.specifier,
                        document.relative_path
                    );
                    statuses.push((index, DependencyStatus::UnresolvedDueToCycle));
                    diagnostics.push(CycleDiagnostic::new(
                        document.relative_path.clone(),
                        dependency.specifier.clone(),
                        target.relative_path.clone(),
                    ));
                }
            }
        }

        let hashed = document.is_parsed() || graph.is_referenced(node);
        let (contents, assigned_hash, output_path) = if hashed {
            // The map URL is left out of the hash; it is derived from the hash itself.
            let mut hash_input = replacements.clone();
            if let Some(map) = &document.source_map {
                hash_input.push(Replacement::new(map.position, ""));
            }
            let rewritten = rewrite(&document.relative_path, &document.contents, hash_input)?;
            let hash = content_hash(&rewritten, self.config.hash_length);
            let file_name = relative.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let name = hashed_file_name(&file_name, &hash);

            let contents = match &document.source_map {
                Some(map) => {
                    let text = format!("{}{}", source_map_name(&name), map.suffix);
                    replacements.push(Replacement::new(map.position, text));
                    rewrite(&document.relative_path, &document.contents, replacements)?
                }
                None => rewritten,
            };

            tracing::debug!("{} -> {}", document.relative_path, name);
            (contents, Some(hash), output_dir.join(name))
        } else {
            let file_name = relative.file_name().unwrap_or_default();
            (document.contents.clone(), None, output_dir.join(file_name))
        };

        let document = graph.document_mut(node);
        for (index, status) in statuses {
            document.dependencies[index].status = status;
        }
        let was_hashed = assigned_hash.is_some();
        document.finalize(contents, assigned_hash, output_path);

        report.finalized += 1;
        if was_hashed {
            report.hashed += 1;
        }
        report.diagnostics.extend(diagnostics);
        Ok(())
    }

    /// Text replacing a reference to `target` from a document written into `from_dir`.
    ///
    /// An authored `./` prefix is kept; without it `lib/a.js` reads as a bare module name.
    /// A percent-encoded specifier gets a percent-encoded path back.
    fn reference(&self, from_dir: &Path, target: &Path, specifier: &str) -> String {
        let encoded = percent_decode(split_suffix(specifier.trim()).0).is_some();
        let encode = |path: String| if encoded { percent_encode(&path) } else { path };

        match self.config.base_url.as_deref() {
            Some(base) => {
                let relative = relative_to_root(self.config.output_root(), target)
                    .unwrap_or_else(|| target.to_string_lossy().replace('\\', "/"));
                qualify(Some(base), &encode(relative))
            }
            None => {
                let relative = encode(relative_path(from_dir, target));
                if specifier.trim_start().starts_with("./") && !relative.starts_with("../") {
                    format!("./{relative}")
                } else {
                    relative
                }
            }
        }
    }
}
