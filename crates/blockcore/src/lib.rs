//! Core schema for the block workflow builder
//!
//! This crate defines the workflow records exchanged with the editor, the
//! schema validation applied to them, and the projection of nodes and edges
//! into a directed graph. Everything here is pure and synchronous.

mod block;
mod error;
pub mod graph;
pub mod schema;
mod workflow;

pub use block::{Block, BlockIOBase, BlockRunner};
pub use error::{BlockError, FlowError, GraphIntegrityError, ValidationError};
pub use graph::{to_graph, DirectedGraph, GraphEdge, GraphVertex};
pub use schema::Schema;
pub use workflow::{Edge, EdgeUpsert, Node, NodeUpsert, Workflow, WorkflowFull, WorkflowUpdate};

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, FlowError>;
