use blockcore::{DirectedGraph, GraphIntegrityError};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Convert to a petgraph graph. Node indices follow vertex insertion order.
pub fn to_petgraph(graph: &DirectedGraph) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
    let mut dag = DiGraph::with_capacity(graph.vertex_count(), graph.edge_count());
    let mut index = HashMap::with_capacity(graph.vertex_count());

    for vertex in graph.vertices() {
        let idx = dag.add_node(vertex.clone());
        index.insert(vertex.clone(), idx);
    }

    // Every endpoint is a vertex of a DirectedGraph, so lookups cannot miss.
    for (source, target) in graph.edges() {
        if let (Some(&from), Some(&to)) = (index.get(source), index.get(target)) {
            dag.add_edge(from, to, ());
        }
    }

    (dag, index)
}

/// A vertex on some directed cycle, if the graph has one (self-loops included).
pub fn find_cycle(graph: &DirectedGraph) -> Option<String> {
    let (dag, _) = to_petgraph(graph);
    toposort(&dag, None)
        .err()
        .map(|cycle| dag[cycle.node_id()].clone())
}

pub fn has_cycle(graph: &DirectedGraph) -> bool {
    find_cycle(graph).is_some()
}

fn in_degrees(dag: &DiGraph<String, ()>) -> Vec<usize> {
    dag.node_indices()
        .map(|idx| dag.edges_directed(idx, Direction::Incoming).count())
        .collect()
}

fn cycle_error(dag: &DiGraph<String, ()>) -> GraphIntegrityError {
    let vertex = match toposort(dag, None) {
        Err(cycle) => dag[cycle.node_id()].clone(),
        Ok(_) => String::new(),
    };
    GraphIntegrityError::Cycle { vertex }
}

/// Topological order of the graph's vertices.
///
/// Among vertices that are ready at the same time, the one inserted first
/// comes first, so the result is stable for a given input.
pub fn execution_order(graph: &DirectedGraph) -> Result<Vec<String>, GraphIntegrityError> {
    let (dag, _) = to_petgraph(graph);
    let mut pending = in_degrees(&dag);

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(dag.node_count());
    while let Some(Reverse(i)) = ready.pop() {
        let idx = NodeIndex::new(i);
        order.push(dag[idx].clone());

        for edge in dag.edges_directed(idx, Direction::Outgoing) {
            let target = edge.target().index();
            pending[target] -= 1;
            if pending[target] == 0 {
                ready.push(Reverse(target));
            }
        }
    }

    if order.len() != dag.node_count() {
        let err = cycle_error(&dag);
        tracing::debug!("Ordering failed: {}", err);
        return Err(err);
    }

    Ok(order)
}

/// Group vertices into layers; every vertex depends only on earlier layers.
///
/// Vertices within a layer are independent of each other and keep insertion
/// order.
pub fn execution_layers(graph: &DirectedGraph) -> Result<Vec<Vec<String>>, GraphIntegrityError> {
    let (dag, _) = to_petgraph(graph);
    let mut pending = in_degrees(&dag);

    let mut current: Vec<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut layers = Vec::new();
    let mut placed = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for edge in dag.edges_directed(NodeIndex::new(i), Direction::Outgoing) {
                let target = edge.target().index();
                pending[target] -= 1;
                if pending[target] == 0 {
                    next.push(target);
                }
            }
        }
        next.sort_unstable();

        placed += current.len();
        layers.push(current.iter().map(|&i| dag[NodeIndex::new(i)].clone()).collect());
        current = next;
    }

    if placed != dag.node_count() {
        return Err(cycle_error(&dag));
    }

    Ok(layers)
}
