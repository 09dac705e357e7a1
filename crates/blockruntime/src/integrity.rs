//! Referential checks on a built graph.
//!
//! The graph builder accepts dangling edge endpoints and repeated vertex keys
//! without complaint. This module classifies both, plus cycles, and applies
//! the policies from [`RuntimeConfig`].

use crate::order::find_cycle;
use crate::runtime::{DanglingEdgePolicy, DuplicateVertexPolicy, RuntimeConfig};
use blockcore::{DirectedGraph, GraphIntegrityError, GraphVertex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// An edge endpoint that no node record selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEndpoint {
    pub source: String,
    pub target: String,
    pub missing: String,
}

/// A vertex key selected by more than one node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub key: String,
    pub count: usize,
}

/// Findings tolerated by the active policies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub dangling: Vec<DanglingEndpoint>,
    pub duplicates: Vec<DuplicateKey>,
    pub has_cycle: bool,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.duplicates.is_empty() && !self.has_cycle
    }
}

/// Every edge endpoint that isn't the key of one of `nodes`, in edge order.
///
/// A self-loop is reported once.
pub fn dangling_endpoints<N: GraphVertex>(
    nodes: &[N],
    graph: &DirectedGraph,
) -> Vec<DanglingEndpoint> {
    let keys: HashSet<&str> = nodes.iter().map(|n| n.vertex_key()).collect();
    let mut found = Vec::new();

    for (source, target) in graph.edges() {
        let mut endpoints = vec![source, target];
        endpoints.dedup();
        for endpoint in endpoints {
            if !keys.contains(endpoint.as_str()) {
                found.push(DanglingEndpoint {
                    source: source.clone(),
                    target: target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }

    found
}

/// Vertex keys selected more than once, in first-seen order.
pub fn duplicate_keys<N: GraphVertex>(nodes: &[N]) -> Vec<DuplicateKey> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();

    for node in nodes {
        let count = counts.entry(node.vertex_key()).or_insert(0);
        if *count == 0 {
            order.push(node.vertex_key());
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|key| counts[key] > 1)
        .map(|key| DuplicateKey {
            key: key.to_string(),
            count: counts[key],
        })
        .collect()
}

/// Check a graph built from `nodes` against the configured policies.
///
/// Checks run in order: duplicates, dangling endpoints, cycles. The first
/// rejected condition is returned as an error.
pub fn check_integrity<N: GraphVertex>(
    nodes: &[N],
    graph: &DirectedGraph,
    config: &RuntimeConfig,
) -> Result<IntegrityReport, GraphIntegrityError> {
    let mut report = IntegrityReport::default();

    let duplicates = duplicate_keys(nodes);
    if let Some(first) = duplicates.first() {
        match config.duplicate_vertices {
            DuplicateVertexPolicy::Reject => {
                return Err(GraphIntegrityError::DuplicateVertex {
                    key: first.key.clone(),
                    count: first.count,
                });
            }
            DuplicateVertexPolicy::Merge => {
                tracing::debug!("Merging {} duplicate vertex keys", duplicates.len());
            }
        }
    }
    report.duplicates = duplicates;

    let dangling = dangling_endpoints(nodes, graph);
    if let Some(first) = dangling.first() {
        match config.dangling_edges {
            DanglingEdgePolicy::Reject => {
                return Err(GraphIntegrityError::DanglingEdge {
                    from: first.source.clone(),
                    to: first.target.clone(),
                    missing: first.missing.clone(),
                });
            }
            DanglingEdgePolicy::Warn => {
                for d in &dangling {
                    tracing::warn!(
                        "Edge {} -> {} references unknown vertex '{}'",
                        d.source,
                        d.target,
                        d.missing
                    );
                }
            }
            DanglingEdgePolicy::Allow => {}
        }
    }
    report.dangling = dangling;

    if let Some(vertex) = find_cycle(graph) {
        if !config.allow_cycles {
            return Err(GraphIntegrityError::Cycle { vertex });
        }
        tracing::debug!("Cycle through '{}' allowed by config", vertex);
        report.has_cycle = true;
    }

    Ok(report)
}
