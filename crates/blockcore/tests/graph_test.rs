// crates/blockcore/tests/graph_test.rs

use blockcore::{
    to_graph, Edge, EdgeUpsert, GraphVertex, Node, NodeUpsert, Workflow, WorkflowFull,
    WorkflowUpdate,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn vertex_set(vertices: &[String]) -> HashSet<&str> {
    vertices.iter().map(String::as_str).collect()
}

fn full_workflow(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowFull {
    WorkflowFull::from_parts(Workflow::new("wf-1", "user-1", "Test"), nodes, edges)
}

#[test]
fn test_upsert_graph_uses_ref_until_persisted() {
    let update = WorkflowUpdate::new(
        vec![NodeUpsert::new("A"), NodeUpsert::new("B").with_id("n2")],
        vec![EdgeUpsert::new("A", "n2")],
    );

    let graph = update.to_graph();

    assert_eq!(vertex_set(graph.vertices()), HashSet::from(["A", "n2"]));
    assert_eq!(graph.edges(), [("A".to_string(), "n2".to_string())]);
    assert!(graph.implicit_vertices().is_empty());
}

#[test]
fn test_resolved_graph_ignores_ref() {
    let workflow = full_workflow(
        vec![Node::new("n1", "A"), Node::new("n2", "B")],
        vec![Edge::new("e1", "n1", "n2")],
    );

    let graph = workflow.to_graph();

    assert_eq!(vertex_set(graph.vertices()), HashSet::from(["n1", "n2"]));
    assert_eq!(graph.edges(), [("n1".to_string(), "n2".to_string())]);
    assert!(!graph.contains_vertex("A"));
    assert!(!graph.contains_vertex("B"));
}

#[test]
fn test_ghost_edge_is_kept() {
    let update = WorkflowUpdate::new(
        vec![NodeUpsert::new("A")],
        vec![EdgeUpsert::new("ghost", "A")],
    );

    let graph = update.to_graph();

    assert_eq!(graph.edge_count(), 1);
    assert!(graph.contains_vertex("ghost"));
    assert_eq!(graph.implicit_vertices(), ["ghost".to_string()]);
}

#[test]
fn test_empty_id_falls_back_to_ref() {
    let node = NodeUpsert::new("A").with_id("");
    assert_eq!(node.vertex_key(), "A");
}

#[test]
fn test_duplicate_keys_collapse_and_parallel_edges_survive() {
    let update = WorkflowUpdate::new(
        vec![
            NodeUpsert::new("A"),
            NodeUpsert::new("B").with_id("A"),
            NodeUpsert::new("C"),
        ],
        vec![EdgeUpsert::new("A", "C"), EdgeUpsert::new("A", "C")],
    );

    let graph = update.to_graph();

    assert_eq!(graph.vertices(), ["A".to_string(), "C".to_string()]);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn test_vertices_precede_edge_endpoints() {
    let nodes = vec![Node::new("n1", "A"), Node::new("n2", "B")];
    let edges = vec![Edge::new("e1", "x", "n1"), Edge::new("e2", "n2", "y")];

    let graph = to_graph(&nodes, &edges);

    let expected: Vec<String> = ["n1", "n2", "x", "y"].iter().map(|s| s.to_string()).collect();
    assert_eq!(graph.vertices(), expected.as_slice());
    assert_eq!(graph.implicit_vertices(), ["x".to_string(), "y".to_string()]);
}

#[test]
fn test_to_graph_accepts_borrowed_records() {
    let nodes = vec![Node::new("n1", "A"), Node::new("n2", "B")];
    let edges = vec![Edge::new("e1", "n1", "n2")];
    let node_refs: Vec<&Node> = nodes.iter().collect();
    let edge_refs: Vec<&Edge> = edges.iter().collect();

    assert_eq!(to_graph(&node_refs, &edge_refs), to_graph(&nodes, &edges));
}

#[test]
fn test_resolution_renames_ref_vertices() {
    let update = WorkflowUpdate::new(
        vec![NodeUpsert::new("A"), NodeUpsert::new("B").with_id("n2")],
        vec![EdgeUpsert::new("A", "n2"), EdgeUpsert::new("n2", "ghost")],
    );

    let mut next = 0;
    let (nodes, edges) = update.resolve_with(|| {
        next += 1;
        format!("id-{}", next)
    });
    let resolved = full_workflow(nodes, edges).to_graph();

    assert_eq!(
        resolved.vertices(),
        ["id-1".to_string(), "n2".to_string(), "ghost".to_string()]
    );
    assert_eq!(
        resolved.edges(),
        [
            ("id-1".to_string(), "n2".to_string()),
            ("n2".to_string(), "ghost".to_string()),
        ]
    );
}

#[test]
fn test_resolution_keeps_edges_on_persisted_vertex() {
    let update = WorkflowUpdate::new(
        vec![NodeUpsert::new("A"), NodeUpsert::new("B").with_id("A")],
        vec![EdgeUpsert::new("A", "A")],
    );
    assert_eq!(update.to_graph().vertices(), ["A".to_string()]);

    let (nodes, edges) = update.resolve_with(|| "gen-1".to_string());
    let resolved = full_workflow(nodes, edges).to_graph();

    assert_eq!(resolved.vertices(), ["gen-1".to_string(), "A".to_string()]);
    assert_eq!(resolved.edges(), [("A".to_string(), "A".to_string())]);
}

#[test]
fn test_full_round_trips_through_update() {
    let workflow = full_workflow(
        vec![Node::new("n1", "A").with_position(1.0, 2.0)],
        vec![Edge::new("e1", "n1", "n1")],
    );

    let update = workflow.to_update();
    let (nodes, edges) = update.resolve_with(|| unreachable!("all ids are present"));

    assert_eq!(nodes, workflow.nodes);
    assert_eq!(edges, workflow.edges);
    assert_eq!(update.to_graph(), workflow.to_graph());
}

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,4}"
}

fn node_upsert() -> impl Strategy<Value = NodeUpsert> {
    (proptest::option::of(key()), key(), -1e6f64..1e6, -1e6f64..1e6).prop_map(
        |(id, r, x, y)| NodeUpsert {
            id,
            r#ref: r,
            pos_x: x,
            pos_y: y,
        },
    )
}

fn edge_upsert() -> impl Strategy<Value = EdgeUpsert> {
    (key(), key()).prop_map(|(s, t)| EdgeUpsert::new(s, t))
}

proptest! {
    #[test]
    fn prop_upsert_key_prefers_id(node in node_upsert()) {
        match node.id.as_deref() {
            Some(id) if !id.is_empty() => prop_assert_eq!(node.vertex_key(), id),
            _ => prop_assert_eq!(node.vertex_key(), node.r#ref.as_str()),
        }
    }

    #[test]
    fn prop_resolved_key_is_id(id in key(), r in key()) {
        let node = Node::new(id.clone(), r);
        prop_assert_eq!(node.vertex_key(), id.as_str());
    }

    #[test]
    fn prop_to_graph_is_idempotent(
        nodes in proptest::collection::vec(node_upsert(), 0..12),
        edges in proptest::collection::vec(edge_upsert(), 0..12),
    ) {
        let first = to_graph(&nodes, &edges);
        let second = to_graph(&nodes, &edges);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_full_vertex_count_matches_distinct_ids(
        ids in proptest::collection::vec(key(), 0..16),
    ) {
        let nodes: Vec<Node> = ids.iter().map(|id| Node::new(id.clone(), "r")).collect();
        let workflow = full_workflow(nodes, Vec::new());
        let distinct: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(workflow.to_graph().vertex_count(), distinct.len());
    }

    #[test]
    fn prop_every_edge_endpoint_is_a_vertex(
        nodes in proptest::collection::vec(node_upsert(), 0..8),
        edges in proptest::collection::vec(edge_upsert(), 0..8),
    ) {
        let graph = to_graph(&nodes, &edges);
        prop_assert_eq!(graph.edge_count(), edges.len());
        for (s, t) in graph.edges() {
            prop_assert!(graph.contains_vertex(s));
            prop_assert!(graph.contains_vertex(t));
        }
    }

    #[test]
    fn prop_resolution_renames_ref_vertices(
        nodes in proptest::collection::vec(node_upsert(), 0..8),
        edges in proptest::collection::vec(edge_upsert(), 0..8),
    ) {
        let keys: HashSet<&str> = nodes.iter().map(|n| n.vertex_key()).collect();
        prop_assume!(keys.len() == nodes.len());

        let update = WorkflowUpdate::new(nodes, edges);
        let mut minted = 0;
        let (resolved_nodes, resolved_edges) = update.resolve_with(|| {
            minted += 1;
            format!("gen-{}", minted)
        });

        let renamed: HashMap<&str, &str> = update
            .nodes
            .iter()
            .zip(&resolved_nodes)
            .filter(|(upsert, _)| upsert.persisted_id().is_none())
            .map(|(upsert, node)| (upsert.r#ref.as_str(), node.id.as_str()))
            .collect();
        let rename = |v: &String| {
            renamed
                .get(v.as_str())
                .map_or_else(|| v.clone(), |id| id.to_string())
        };

        let before = update.to_graph();
        let after = full_workflow(resolved_nodes.clone(), resolved_edges).to_graph();

        let expected_vertices: Vec<String> = before.vertices().iter().map(rename).collect();
        let expected_edges: Vec<(String, String)> =
            before.edges().iter().map(|(s, t)| (rename(s), rename(t))).collect();
        prop_assert_eq!(after.vertices(), expected_vertices.as_slice());
        prop_assert_eq!(after.edges(), expected_edges.as_slice());
    }
}
