//! Errors raised while rendering.

use stencil_compiler::CompileError;
use thiserror::Error;

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    /// A namespace-bound renderer was given something other than a partial name.
    #[error("Template name '{0}' must be a partial name starting with '.' when rendering within a namespace")]
    InvalidPartialName(String),

    /// An unbound renderer was given a partial name.
    #[error("Partial template name '{0}' needs a namespace; use for_namespace first")]
    MissingNamespace(String),

    #[error("Invalid template data: {0}")]
    InvalidData(String),

    #[error("Render error at node {node_id}: {message}")]
    Runtime { node_id: String, message: String },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl RenderError {
    pub fn runtime(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Runtime {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}

impl From<stencil_tree::TreeError> for RenderError {
    fn from(err: stencil_tree::TreeError) -> Self {
        RenderError::Compile(CompileError::from(err))
    }
}
