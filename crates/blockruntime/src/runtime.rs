use crate::integrity::{check_integrity, IntegrityReport};
use crate::order::execution_order;
use crate::registry::BlockRegistry;
use blockcore::{
    Block, BlockError, BlockIOBase, DirectedGraph, FlowError, GraphVertex, WorkflowFull,
    WorkflowUpdate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Entry point for collaborators that consume workflow graphs
pub struct WorkflowRuntime {
    registry: Arc<BlockRegistry>,
    config: RuntimeConfig,
}

impl WorkflowRuntime {
    /// Create a runtime with the built-in blocks and default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the built-in blocks and custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(BlockRegistry::with_builtins()), config)
    }

    /// Create a runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<BlockRegistry>, config: RuntimeConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Build, check and order the graph of an upsert payload
    pub fn prepare_update(&self, update: &WorkflowUpdate) -> Result<PreparedGraph, FlowError> {
        tracing::debug!(
            "Preparing upsert graph: {} nodes, {} edges",
            update.nodes.len(),
            update.edges.len()
        );
        self.prepare(&update.nodes, update.to_graph())
    }

    /// Build, check and order the graph of a persisted workflow
    pub fn prepare_full(&self, workflow: &WorkflowFull) -> Result<PreparedGraph, FlowError> {
        tracing::debug!(
            "Preparing workflow graph {}: {} nodes, {} edges",
            workflow.id,
            workflow.nodes.len(),
            workflow.edges.len()
        );
        self.prepare(&workflow.nodes, workflow.to_graph())
    }

    fn prepare<N: GraphVertex>(
        &self,
        nodes: &[N],
        graph: DirectedGraph,
    ) -> Result<PreparedGraph, FlowError> {
        let report = check_integrity(nodes, &graph, &self.config).map_err(|e| {
            tracing::info!("Rejected workflow graph: {}", e);
            e
        })?;

        let order = if report.has_cycle {
            None
        } else {
            Some(execution_order(&graph)?)
        };

        Ok(PreparedGraph {
            graph,
            report,
            order,
        })
    }

    /// Run a block through the registry
    pub async fn run_block(&self, block: &Block) -> Result<BlockIOBase, BlockError> {
        self.registry.run(block).await
    }
}

impl Default for WorkflowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// A checked graph, ready for traversal
#[derive(Debug, Clone)]
pub struct PreparedGraph {
    pub graph: DirectedGraph,
    pub report: IntegrityReport,
    /// Topological order; `None` when a tolerated cycle makes it undefined
    pub order: Option<Vec<String>>,
}

/// What to do with an edge endpoint that names no node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingEdgePolicy {
    Allow,
    Warn,
    Reject,
}

/// What to do when several nodes select the same vertex key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateVertexPolicy {
    Merge,
    Reject,
}

/// Configuration for the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub dangling_edges: DanglingEdgePolicy,
    pub duplicate_vertices: DuplicateVertexPolicy,
    pub allow_cycles: bool,
}

impl RuntimeConfig {
    /// Accept everything the graph builder accepts
    pub fn permissive() -> Self {
        Self {
            dangling_edges: DanglingEdgePolicy::Allow,
            duplicate_vertices: DuplicateVertexPolicy::Merge,
            allow_cycles: true,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dangling_edges: DanglingEdgePolicy::Reject,
            duplicate_vertices: DuplicateVertexPolicy::Reject,
            allow_cycles: false,
        }
    }
}
