/// Stencil compiler
///
/// Validates and transforms stencil template trees with ordered passes, then
/// generates JavaScript or Java source for them. The interpreter lives in
/// `stencil-eval` and shares the scope, directive and pass machinery here.

pub mod backend;
pub mod bidi;
pub mod directives;
pub mod driver;
pub mod error;
pub mod escape;
pub mod msgs;
pub mod passes;
pub mod scope;
pub mod templates;

pub use backend::{
    generate, generate_in_scope, Backend, JavaSrcBackend, JavaSrcOptions, JsSrcBackend,
    JsSrcOptions, OutputUnit,
};
pub use bidi::BidiGlobalDir;
pub use directives::{BackendKind, DirectiveRegistry, PrintDirective, TargetExpr};
pub use driver::{prepare_tree, CompileOptions, CompileOutput, Compiler, Target};
pub use error::{CompileError, Result};
pub use msgs::{MsgBundle, MsgPart};
pub use scope::{CallScope, ScopeGuard, Slot, SlotValue};
pub use templates::{OverridePolicy, TemplateSet};
