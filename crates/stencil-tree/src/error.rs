//! Structural errors raised by tree operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Error, Debug)]
pub enum TreeError {
    /// Appending, inserting or replacing would break single ownership or
    /// create a cycle. The tree is left unchanged.
    #[error("invalid tree operation on node {node}: {reason}")]
    InvalidTreeOperation { node: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed tree description: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeError {
    pub fn invalid(node: impl Into<String>, reason: impl Into<String>) -> Self {
        TreeError::InvalidTreeOperation {
            node: node.into(),
            reason: reason.into(),
        }
    }
}
