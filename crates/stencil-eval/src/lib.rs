//! Stencil template interpreter.
//!
//! Renders templates straight from the validated tree. A [`Renderer`] is
//! `Send + Sync`; every render call opens its own call scope, so renders may
//! run concurrently over one shared renderer.

mod data;
mod error;
mod eval;
mod renderer;
mod value;

pub use data::TemplateData;
pub use error::{RenderError, Result};
pub use eval::eval_expr;
pub use renderer::{InterpreterOptions, Renderer};
pub use value::Value;
