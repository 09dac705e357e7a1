use crate::graph::{to_graph, DirectedGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Edge as submitted by the client. `id` is absent until persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeUpsert {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

impl EdgeUpsert {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Node as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeUpsert {
    #[serde(default)]
    pub id: Option<String>,
    /// Reference generated by the frontend, stable before a server id exists
    #[serde(rename = "ref")]
    pub r#ref: String,
    pub pos_x: f64,
    pub pos_y: f64,
}

impl NodeUpsert {
    pub fn new(r#ref: impl Into<String>) -> Self {
        Self {
            id: None,
            r#ref: r#ref.into(),
            pos_x: 0.0,
            pos_y: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self
    }

    /// Server id, if one was assigned and is non-empty.
    pub fn persisted_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    pub id: String,
    #[serde(rename = "ref")]
    pub r#ref: String,
    pub pos_x: f64,
    pub pos_y: f64,
}

impl Node {
    pub fn new(id: impl Into<String>, r#ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            r#ref: r#ref.into(),
            pos_x: 0.0,
            pos_y: 0.0,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self
    }
}

/// Persisted edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

impl From<Node> for NodeUpsert {
    fn from(node: Node) -> Self {
        Self {
            id: Some(node.id),
            r#ref: node.r#ref,
            pos_x: node.pos_x,
            pos_y: node.pos_y,
        }
    }
}

impl From<Edge> for EdgeUpsert {
    fn from(edge: Edge) -> Self {
        Self {
            id: Some(edge.id),
            source: edge.source,
            target: edge.target,
        }
    }
}

/// Workflow metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    pub name: String,
    pub description: String,
}

impl Workflow {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            organization_id: None,
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }
}

/// Upsert payload, not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowUpdate {
    pub nodes: Vec<NodeUpsert>,
    pub edges: Vec<EdgeUpsert>,
}

impl WorkflowUpdate {
    pub fn new(nodes: Vec<NodeUpsert>, edges: Vec<EdgeUpsert>) -> Self {
        Self { nodes, edges }
    }

    pub fn to_graph(&self) -> DirectedGraph {
        to_graph(&self.nodes, &self.edges)
    }

    /// Resolve the payload with random UUID v4 ids.
    pub fn resolve(&self) -> (Vec<Node>, Vec<Edge>) {
        self.resolve_with(|| Uuid::new_v4().to_string())
    }

    /// Assign ids to unpersisted nodes and edges and point edges that
    /// reference a node by `ref` at its new id.
    ///
    /// Existing ids are kept. An endpoint that names a persisted node id, or
    /// that matches no ref, is left as is, so an endpoint the builder keyed to
    /// a persisted node stays on it. On duplicate refs the last node wins.
    pub fn resolve_with<F>(&self, mut next_id: F) -> (Vec<Node>, Vec<Edge>)
    where
        F: FnMut() -> String,
    {
        let persisted: HashSet<&str> =
            self.nodes.iter().filter_map(|n| n.persisted_id()).collect();
        let mut renamed: HashMap<&str, String> = HashMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for upsert in &self.nodes {
            let id = match upsert.persisted_id() {
                Some(id) => id.to_string(),
                None => {
                    let id = next_id();
                    renamed.insert(upsert.r#ref.as_str(), id.clone());
                    id
                }
            };
            nodes.push(Node {
                id,
                r#ref: upsert.r#ref.clone(),
                pos_x: upsert.pos_x,
                pos_y: upsert.pos_y,
            });
        }

        let remap = |endpoint: &str| -> String {
            if persisted.contains(endpoint) {
                return endpoint.to_string();
            }
            renamed
                .get(endpoint)
                .cloned()
                .unwrap_or_else(|| endpoint.to_string())
        };

        let mut edges = Vec::with_capacity(self.edges.len());
        for upsert in &self.edges {
            let id = match upsert.id.as_deref().filter(|id| !id.is_empty()) {
                Some(id) => id.to_string(),
                None => next_id(),
            };
            edges.push(Edge {
                id,
                source: remap(&upsert.source),
                target: remap(&upsert.target),
            });
        }

        tracing::trace!(
            nodes = nodes.len(),
            edges = edges.len(),
            minted = renamed.len(),
            "resolved workflow update"
        );

        (nodes, edges)
    }
}

/// Persisted workflow with its resolved nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowFull {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    pub name: String,
    pub description: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl WorkflowFull {
    pub fn from_parts(workflow: Workflow, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            id: workflow.id,
            user_id: workflow.user_id,
            organization_id: workflow.organization_id,
            name: workflow.name,
            description: workflow.description,
            nodes,
            edges,
        }
    }

    pub fn metadata(&self) -> Workflow {
        Workflow {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            organization_id: self.organization_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    pub fn to_graph(&self) -> DirectedGraph {
        to_graph(&self.nodes, &self.edges)
    }

    /// Project back to an upsert payload for editing.
    pub fn to_update(&self) -> WorkflowUpdate {
        WorkflowUpdate {
            nodes: self.nodes.iter().cloned().map(NodeUpsert::from).collect(),
            edges: self.edges.iter().cloned().map(EdgeUpsert::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("gen-{}", n)
        }
    }

    #[test]
    fn resolve_keeps_existing_ids() {
        let update = WorkflowUpdate::new(
            vec![NodeUpsert::new("A").with_id("n1")],
            vec![EdgeUpsert::new("n1", "n1").with_id("e1")],
        );

        let (nodes, edges) = update.resolve_with(counter());

        assert_eq!(nodes[0].id, "n1");
        assert_eq!(edges[0], Edge::new("e1", "n1", "n1"));
    }

    #[test]
    fn resolve_treats_empty_id_as_absent() {
        let update = WorkflowUpdate::new(
            vec![NodeUpsert::new("A").with_id("")],
            vec![EdgeUpsert::new("A", "A").with_id("")],
        );

        let (nodes, edges) = update.resolve_with(counter());

        assert_eq!(nodes[0].id, "gen-1");
        assert_eq!(edges[0], Edge::new("gen-2", "gen-1", "gen-1"));
    }

    #[test]
    fn resolve_last_duplicate_ref_wins() {
        let update = WorkflowUpdate::new(
            vec![NodeUpsert::new("A"), NodeUpsert::new("A")],
            vec![EdgeUpsert::new("A", "x")],
        );

        let (nodes, edges) = update.resolve_with(counter());

        assert_eq!(nodes[1].id, "gen-2");
        assert_eq!(edges[0].source, "gen-2");
        assert_eq!(edges[0].target, "x");
    }

    #[test]
    fn resolve_keeps_endpoints_on_persisted_ids() {
        let update = WorkflowUpdate::new(
            vec![NodeUpsert::new("A"), NodeUpsert::new("B").with_id("A")],
            vec![EdgeUpsert::new("A", "A").with_id("e1")],
        );

        let (nodes, edges) = update.resolve_with(counter());

        assert_eq!(nodes[0].id, "gen-1");
        assert_eq!(nodes[1].id, "A");
        assert_eq!(edges[0], Edge::new("e1", "A", "A"));
    }
}
