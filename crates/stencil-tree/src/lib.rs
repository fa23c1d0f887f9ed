//! Syntax tree for stencil templates.
//!
//! A [`Tree`] owns every node of one file set in an arena. Node kinds form a
//! closed set ([`NodeKind`]), so passes written against the tree get
//! exhaustiveness checking when they match on a node.

pub mod ast;
pub mod dump;
pub mod error;
pub mod load;
pub mod source;
pub mod tree;

pub use ast::*;
pub use dump::dump_tree;
pub use error::{Result, TreeError};
pub use load::{load_file, load_str};
pub use tree::{NodeRef, Tree};

/// Marker that begins a partial (namespace-relative) template name.
pub const PARTIAL_NAME_MARKER: char = '.';

/// Returns true if `name` is relative to an enclosing namespace.
pub fn is_partial_name(name: &str) -> bool {
    name.starts_with(PARTIAL_NAME_MARKER)
}
