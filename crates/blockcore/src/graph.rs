//! Projection of flat node/edge records into a directed graph.
//!
//! The builder is permissive. Repeated vertex keys collapse into
//! one vertex, an edge endpoint that names no node creates a vertex on the
//! fly, and parallel edges are kept. Nothing is rejected here; the runtime's
//! integrity checks decide what to make of those cases.

use crate::workflow::{Edge, EdgeUpsert, Node, NodeUpsert};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// A record that contributes one vertex to the graph.
pub trait GraphVertex {
    fn vertex_key(&self) -> &str;
}

/// A record that contributes one directed edge to the graph.
pub trait GraphEdge {
    fn endpoints(&self) -> (&str, &str);
}

impl GraphVertex for NodeUpsert {
    /// The server id when present and non-empty, otherwise the client ref.
    fn vertex_key(&self) -> &str {
        self.persisted_id().unwrap_or(&self.r#ref)
    }
}

impl GraphVertex for Node {
    fn vertex_key(&self) -> &str {
        &self.id
    }
}

impl GraphEdge for EdgeUpsert {
    fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }
}

impl GraphEdge for Edge {
    fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }
}

impl<T: GraphVertex + ?Sized> GraphVertex for &T {
    fn vertex_key(&self) -> &str {
        (**self).vertex_key()
    }
}

impl<T: GraphEdge + ?Sized> GraphEdge for &T {
    fn endpoints(&self) -> (&str, &str) {
        (**self).endpoints()
    }
}

/// Vertex set plus directed edge list.
///
/// Vertices keep insertion order. Edges keep input order and multiplicity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectedGraph {
    vertices: Vec<String>,
    edges: Vec<(String, String)>,
    /// Vertices created by an edge endpoint rather than by a node record
    implicit: Vec<String>,
    index: HashSet<String>,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Returns false if the key was already present.
    pub fn add_vertex(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.index.contains(&key) {
            return false;
        }
        self.index.insert(key.clone());
        self.vertices.push(key);
        true
    }

    /// Add a directed edge, creating any endpoint that isn't a vertex yet.
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        for endpoint in [&source, &target] {
            if self.add_vertex(endpoint.as_str()) {
                self.implicit.push(endpoint.clone());
            }
        }
        self.edges.push((source, target));
    }

    pub fn vertices(&self) -> &[String] {
        &self.vertices
    }

    pub fn contains_vertex(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices that exist only because an edge referenced them.
    pub fn implicit_vertices(&self) -> &[String] {
        &self.implicit
    }

    pub fn successors<'a>(&'a self, vertex: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(s, _)| s == vertex)
            .map(|(_, t)| t.as_str())
    }

    pub fn predecessors<'a>(&'a self, vertex: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(_, t)| t == vertex)
            .map(|(s, _)| s.as_str())
    }
}

impl Serialize for DirectedGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DirectedGraph", 3)?;
        state.serialize_field("vertices", &self.vertices)?;
        state.serialize_field("edges", &self.edges)?;
        state.serialize_field("implicit", &self.implicit)?;
        state.end()
    }
}

/// Build a directed graph from node and edge records.
///
/// Vertices from `nodes` are added first, then every edge in order.
pub fn to_graph<N, E>(nodes: &[N], edges: &[E]) -> DirectedGraph
where
    N: GraphVertex,
    E: GraphEdge,
{
    let mut graph = DirectedGraph::new();

    for node in nodes {
        graph.add_vertex(node.vertex_key());
    }

    for edge in edges {
        let (source, target) = edge.endpoints();
        graph.add_edge(source, target);
    }

    tracing::trace!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        implicit = graph.implicit.len(),
        "built directed graph"
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_vertex_merges() {
        let mut graph = DirectedGraph::new();
        assert!(graph.add_vertex("a"));
        assert!(!graph.add_vertex("a"));
        assert_eq!(graph.vertices(), ["a".to_string()]);
    }

    #[test]
    fn self_loop_creates_one_implicit_vertex() {
        let mut graph = DirectedGraph::new();
        graph.add_edge("x", "x");
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.implicit_vertices(), ["x".to_string()]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn neighbours_follow_edge_direction() {
        let mut graph = DirectedGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        graph.add_edge("c", "b");

        assert_eq!(graph.successors("a").collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(graph.predecessors("b").collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(graph.successors("b").count(), 0);
    }
}
