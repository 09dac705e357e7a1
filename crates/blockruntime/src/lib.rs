//! Workflow graph runtime
//!
//! Collaborators of the core schema: the block registry that dispatches
//! `run` by block type, integrity checks over built graphs, and execution
//! ordering.

pub mod blocks;
pub mod integrity;
pub mod order;
mod registry;
mod runtime;

pub use integrity::{check_integrity, DanglingEndpoint, DuplicateKey, IntegrityReport};
pub use order::{execution_layers, execution_order, find_cycle, has_cycle, to_petgraph};
pub use registry::{BlockFactory, BlockMetadata, BlockRegistry};
pub use runtime::{
    DanglingEdgePolicy, DuplicateVertexPolicy, PreparedGraph, RuntimeConfig, WorkflowRuntime,
};
