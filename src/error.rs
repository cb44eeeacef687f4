use crate::graph::NodeId;
use thiserror::Error;

/// Errors raised while building or differentiating a computation graph.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Node {0} not found in this engine")]
    NodeNotFound(NodeId),

    #[error("Dimension mismatch: expected {expected} inputs, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error while writing graph: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format graph: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Graphviz failed: {0}")]
    Graphviz(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
