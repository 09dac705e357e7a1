use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    #[error("Graph integrity error: {0}")]
    Integrity(#[from] GraphIntegrityError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A payload failed schema validation.
///
/// `path` names the offending field, e.g. `nodes[1].ref`; `$` is the
/// document root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, "field required")
    }

    pub fn unknown(path: impl Into<String>) -> Self {
        Self::new(path, "extra fields not permitted")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// The block type has no runner. This is a registration defect, not a
    /// user error.
    #[error("Block type '{block_type}' has no run implementation")]
    NotImplemented { block_type: String },

    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphIntegrityError {
    #[error("Edge {from} -> {to} references unknown vertex '{missing}'")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Vertex key '{key}' is selected by {count} nodes")]
    DuplicateVertex { key: String, count: usize },

    #[error("Cyclic dependency detected at vertex '{vertex}'")]
    Cycle { vertex: String },
}
