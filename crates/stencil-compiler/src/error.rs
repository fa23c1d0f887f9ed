/// Error types for the stencil compiler

use std::path::PathBuf;
use stencil_tree::TreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {file}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Found two definitions for template name '{name}', both in the file {file}.")]
    DuplicateTemplateSameFile { name: String, file: String },

    #[error("Found two definitions for template name '{name}' in two different files {first_file} and {second_file}.")]
    DuplicateTemplate {
        name: String,
        first_file: String,
        second_file: String,
    },

    #[error("Template name '{0}' is not fully qualified; namespaces must be prepended first")]
    PartialTemplateName(String),

    #[error("Unknown print directive '{name}'{}", site_suffix(.site))]
    UnknownDirective { name: String, site: Option<String> },

    #[error("Print directive '{name}' takes {expected} argument(s), found {found}{}", site_suffix(.site))]
    Arity {
        name: String,
        expected: String,
        found: usize,
        site: Option<String>,
    },

    #[error("Print directive '{directive}' has no {backend} implementation (node {node_id})")]
    UnsupportedDirectiveForBackend {
        directive: String,
        backend: String,
        node_id: String,
    },

    #[error("Print directive '{name}' got an invalid argument: {message}")]
    InvalidDirectiveArgument { name: String, message: String },

    #[error("Call scope entered while a frame is already open")]
    ScopeReentry,

    #[error("Call scope slot {0} seeded outside an open frame")]
    ScopeNotEntered(&'static str),

    #[error("Call scope slot {0} seeded twice in one frame")]
    DuplicateSeed(&'static str),

    #[error("Call scope slot {0} read outside a frame or before it was seeded")]
    UnseededSlot(&'static str),

    #[error("Code generation error at node {node_id}: {message}")]
    CodeGeneration { node_id: String, message: String },

    #[error("Output file {path} would be written for both {first_source} and {second_source}")]
    DuplicateOutput {
        path: String,
        first_source: String,
        second_source: String,
    },
}

impl CompileError {
    pub fn codegen(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::CodeGeneration {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    pub fn json(file: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CompileError::Json {
            file: file.into(),
            source,
        }
    }

    /// Attach the print site an unknown-directive or arity error came from.
    pub fn at_site(self, site: impl Into<String>) -> Self {
        match self {
            CompileError::UnknownDirective { name, .. } => CompileError::UnknownDirective {
                name,
                site: Some(site.into()),
            },
            CompileError::Arity {
                name,
                expected,
                found,
                ..
            } => CompileError::Arity {
                name,
                expected,
                found,
                site: Some(site.into()),
            },
            other => other,
        }
    }

    /// True for both wordings of the duplicate-template error.
    pub fn is_duplicate_template(&self) -> bool {
        matches!(
            self,
            CompileError::DuplicateTemplate { .. } | CompileError::DuplicateTemplateSameFile { .. }
        )
    }
}

fn site_suffix(site: &Option<String>) -> String {
    site.as_ref()
        .map(|s| format!(" in {}", s))
        .unwrap_or_default()
}
