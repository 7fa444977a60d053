//! The asset dependency graph.
//!
//! Nodes are [`Document`]s, edges point from a document to every distinct
//! in-tree document it references. The graph is built in two steps so that file
//! parsing can run in parallel:
//!
//! 1. every parsed file is added with [`AssetGraph::add_document`]
//! 2. [`AssetGraph::connect`] turns resolved dependencies into edges and fails
//!    with [`CachebustError::GraphInconsistency`] if a dependency points at a
//!    path that never became a document
//!
//! Cycles are allowed here; the [`TopologicalHasher`](crate::hasher::TopologicalHasher)
//! breaks them when it orders the work.

pub mod builder;

pub use builder::{GraphBuild, GraphBuilder, ReadFailure};

use crate::core::CachebustError;
use crate::document::Document;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directed graph of documents and the references between them.
#[derive(Debug, Default)]
pub struct AssetGraph {
    /// The underlying directed graph; an edge `a -> b` means `a` references `b`.
    graph: DiGraph<Document, ()>,
    /// Map from absolute file path to node index.
    node_map: HashMap<PathBuf, NodeIndex>,
}

impl AssetGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any earlier document with the same path.
    pub fn add_document(&mut self, document: Document) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&document.file_path) {
            self.graph[index] = document;
            return index;
        }
        let path = document.file_path.clone();
        let index = self.graph.add_node(document);
        self.node_map.insert(path, index);
        index
    }

    /// Create one edge per distinct in-tree target of every document.
    pub fn connect(&mut self) -> Result<(), CachebustError> {
        let mut edges = Vec::new();

        for from in self.graph.node_indices() {
            let document = &self.graph[from];
            for dependency in &document.dependencies {
                let Some(target) = dependency.file_path.as_deref() else {
                    continue;
                };
                let to = self.node(target).ok_or_else(|| CachebustError::GraphInconsistency {
                    document: document.relative_path.clone(),
                    dependency: dependency.specifier.clone(),
                    target: target.display().to_string(),
                })?;
                edges.push((from, to));
            }
        }

        for (from, to) in edges {
            // Several specifiers may name the same file; keep one edge.
            if !self.graph.contains_edge(from, to) {
                self.graph.add_edge(from, to, ());
            }
        }

        Ok(())
    }

    /// Node of the document at `path`.
    #[must_use]
    pub fn node(&self, path: &Path) -> Option<NodeIndex> {
        self.node_map.get(path).copied()
    }

    /// Document at `index`.
    #[must_use]
    pub fn document(&self, index: NodeIndex) -> &Document {
        &self.graph[index]
    }

    /// Mutable document at `index`.
    pub fn document_mut(&mut self, index: NodeIndex) -> &mut Document {
        &mut self.graph[index]
    }

    /// Document at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Document> {
        self.node(path).map(|index| &self.graph[index])
    }

    /// Every node, ordered by the document's relative path.
    #[must_use]
    pub fn nodes_by_path(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].relative_path.cmp(&self.graph[*b].relative_path));
        nodes
    }

    /// Every document, ordered by relative path.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.nodes_by_path().into_iter().map(move |index| &self.graph[index])
    }

    /// Documents `index` references (distinct).
    pub fn dependencies_of(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Outgoing)
    }

    /// Documents referencing `index` (distinct).
    pub fn dependents_of(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Incoming)
    }

    /// Whether any other document references `index`.
    #[must_use]
    pub fn is_referenced(&self, index: NodeIndex) -> bool {
        self.dependents_of(index).any(|from| from != index)
    }

    /// Documents matched by no plugin.
    pub fn unmatched(&self) -> impl Iterator<Item = &Document> {
        self.documents().filter(|d| !d.is_parsed())
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of distinct document-to-document references.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Underlying petgraph graph, for algorithms that need it directly.
    #[must_use]
    pub const fn inner(&self) -> &DiGraph<Document, ()> {
        &self.graph
    }
}
