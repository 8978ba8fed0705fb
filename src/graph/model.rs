use indexmap::IndexMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Graph, Undirected};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};

pub type LabeledGraph = Graph<String, String, Undirected>;

/// Immutable adjacency/label store: an undirected graph with string labels on
/// vertices and edges, without self-loops and without parallel edges.
#[derive(Debug, Clone)]
pub struct InternalGraph {
    graph: LabeledGraph,
}

impl InternalGraph {
    pub fn builder() -> InternalGraphBuilder {
        InternalGraphBuilder::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertex_label(&self, index: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(index))
            .map(String::as_str)
    }

    pub fn edge_label(&self, index: usize) -> Option<&str> {
        self.graph
            .edge_weight(EdgeIndex::new(index))
            .map(String::as_str)
    }

    pub fn edge_endpoints(&self, index: usize) -> Option<(usize, usize)> {
        self.graph
            .edge_endpoints(EdgeIndex::new(index))
            .map(|(a, b)| (a.index(), b.index()))
    }

    pub fn degree(&self, index: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(index)).count()
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(index))
            .map(NodeIndex::index)
    }

    /// Label of the edge between two vertices, or `None` when not adjacent.
    pub fn edge_label_between(&self, a: usize, b: usize) -> Option<&str> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|edge| self.graph.edge_weight(edge))
            .map(String::as_str)
    }

    /// Number of vertices carrying the given label.
    pub fn vertex_label_count(&self, label: &str) -> usize {
        self.graph
            .node_weights()
            .filter(|weight| weight.as_str() == label)
            .count()
    }

    /// Number of edges carrying the given label.
    pub fn edge_label_count(&self, label: &str) -> usize {
        self.graph
            .edge_weights()
            .filter(|weight| weight.as_str() == label)
            .count()
    }

    pub fn vertex_label_histogram(&self) -> IndexMap<&str, usize> {
        let mut histogram = IndexMap::new();
        for weight in self.graph.node_weights() {
            *histogram.entry(weight.as_str()).or_insert(0usize) += 1;
        }
        histogram
    }

    pub fn edge_label_histogram(&self) -> IndexMap<&str, usize> {
        let mut histogram = IndexMap::new();
        for weight in self.graph.edge_weights() {
            *histogram.entry(weight.as_str()).or_insert(0usize) += 1;
        }
        histogram
    }

    pub fn edge_triples(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                edge.source().index(),
                edge.target().index(),
                edge.weight().as_str(),
            )
        })
    }

    /// Rebuild the store under a relabeling of vertex indices. `perm[old]`
    /// gives the new index of each vertex; the result is isomorphic to `self`.
    pub(crate) fn permuted(&self, perm: &[usize]) -> InternalGraph {
        let count = self.vertex_count();
        debug_assert_eq!(perm.len(), count);

        let mut inverse = vec![0usize; count];
        for (old, new) in perm.iter().enumerate() {
            inverse[*new] = old;
        }

        let mut graph = LabeledGraph::with_capacity(count, self.edge_count());
        for new in 0..count {
            let label = self.vertex_label(inverse[new]).unwrap_or_default();
            graph.add_node(label.to_string());
        }
        for (a, b, label) in self.edge_triples() {
            graph.add_edge(
                NodeIndex::new(perm[a]),
                NodeIndex::new(perm[b]),
                label.to_string(),
            );
        }
        InternalGraph { graph }
    }

    /// Whether every vertex label decodes as a chemical element and every edge
    /// label as a bond. Used to derive the molecule flag at construction.
    pub fn is_chemical(&self) -> bool {
        self.vertex_count() > 0
            && self.graph.node_weights().all(|label| is_element(label))
            && self.graph.edge_weights().all(|label| is_bond(label))
    }
}

const ELEMENTS: &[&str] = &[
    "H", "B", "C", "N", "O", "F", "Na", "Mg", "Si", "P", "S", "Cl", "K", "Ca", "Fe", "Br", "I",
];

const BONDS: &[&str] = &["-", "=", "#", ":", "1", "2", "3"];

fn is_element(label: &str) -> bool {
    ELEMENTS.contains(&label)
}

fn is_bond(label: &str) -> bool {
    BONDS.contains(&label)
}

/// Builder enforcing the structural invariants before the store is published.
#[derive(Debug, Default)]
pub struct InternalGraphBuilder {
    graph: LabeledGraph,
}

impl InternalGraphBuilder {
    pub fn add_vertex(&mut self, label: impl Into<String>) -> usize {
        self.graph.add_node(label.into()).index()
    }

    pub fn add_edge(&mut self, a: usize, b: usize, label: impl Into<String>) -> Result<usize> {
        if a == b {
            return Err(GraphError::input(format!("self-loop on vertex {a}")));
        }
        if a >= self.graph.node_count() || b >= self.graph.node_count() {
            return Err(GraphError::input(format!(
                "edge endpoint out of range: ({a}, {b}) with {} vertices",
                self.graph.node_count()
            )));
        }
        let (source, target) = (NodeIndex::new(a), NodeIndex::new(b));
        if self.graph.find_edge(source, target).is_some() {
            return Err(GraphError::input(format!(
                "parallel edge between vertices {a} and {b}"
            )));
        }
        Ok(self.graph.add_edge(source, target, label.into()).index())
    }

    pub fn build(self) -> InternalGraph {
        InternalGraph { graph: self.graph }
    }
}

/// Interchange representation for the reference JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGraph {
    pub vertices: Vec<RawVertex>,
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVertex {
    pub id: i64,
    pub label: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: i64,
    pub target: i64,
    pub label: String,
}
