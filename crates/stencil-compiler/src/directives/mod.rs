//! Print directives: named value transforms applied at print sites.
//!
//! A directive declares its name, the argument counts it accepts, and whether
//! it cancels auto-escaping. Each backend asks the directive for its own
//! realization; a directive that lacks one cannot be used with that backend.

mod basic;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use stencil_tree::DirectiveCall;

use crate::error::{CompileError, Result};

pub(crate) use basic::{JAVA_UTILS, JS_RUNTIME};
pub use basic::{
    ChangeNewlineToBrDirective, EscapeHtmlDirective, EscapeJsStringDirective,
    EscapeUriDirective, NoAutoescapeDirective, TruncateDirective,
};

/// The targets a print directive can be realized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Interpreter,
    JsSrc,
    JavaSrc,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Interpreter => "interpreter",
            BackendKind::JsSrc => "JS source",
            BackendKind::JavaSrc => "Java source",
        };
        f.write_str(name)
    }
}

/// Highest precedence: the expression never needs parenthesizing.
pub const MAX_PRECEDENCE: u8 = u8::MAX;

/// A fragment of generated source together with its operator precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetExpr {
    pub text: String,
    pub precedence: u8,
}

impl TargetExpr {
    pub fn new(text: impl Into<String>, precedence: u8) -> Self {
        Self {
            text: text.into(),
            precedence,
        }
    }

    /// A function call, which binds tighter than any operator.
    pub fn call(function: &str, args: &[&TargetExpr]) -> Self {
        let args: Vec<&str> = args.iter().map(|a| a.text.as_str()).collect();
        Self::new(format!("{}({})", function, args.join(", ")), MAX_PRECEDENCE)
    }

    /// The text, wrapped in parentheses if it binds looser than `min`.
    pub fn text_with_min_precedence(&self, min: u8) -> String {
        if self.precedence < min {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Transform applied directly to a value while interpreting a template.
/// Argument values are only known at render time, so they are checked here.
pub trait InterpretedDirective {
    fn apply_for_interpreter(&self, value: &str, args: &[JsonValue]) -> Result<String>;
}

/// Realization as a JavaScript source fragment.
pub trait JsSrcDirective {
    fn apply_for_js_src(&self, value: &TargetExpr, args: &[TargetExpr]) -> TargetExpr;
}

/// Realization as a Java source fragment.
pub trait JavaSrcDirective {
    fn apply_for_java_src(&self, value: &TargetExpr, args: &[TargetExpr]) -> TargetExpr;
}

/// Descriptor of one print directive.
pub trait PrintDirective: Send + Sync {
    /// Invocation name, including the leading `|`.
    fn name(&self) -> &'static str;

    /// Accepted argument counts.
    fn valid_args_sizes(&self) -> &'static [usize];

    /// Whether applying this directive satisfies the print site's escaping
    /// obligation on its own.
    fn cancels_autoescape(&self) -> bool;

    fn interpreted(&self) -> Option<&dyn InterpretedDirective> {
        None
    }

    fn js_src(&self) -> Option<&dyn JsSrcDirective> {
        None
    }

    fn java_src(&self) -> Option<&dyn JavaSrcDirective> {
        None
    }

    fn supports(&self, backend: BackendKind) -> bool {
        match backend {
            BackendKind::Interpreter => self.interpreted().is_some(),
            BackendKind::JsSrc => self.js_src().is_some(),
            BackendKind::JavaSrc => self.java_src().is_some(),
        }
    }
}

/// Fail with an arity error unless `found` is an accepted argument count.
pub fn check_arity(directive: &dyn PrintDirective, found: usize) -> Result<()> {
    let valid = directive.valid_args_sizes();
    if valid.contains(&found) {
        return Ok(());
    }
    let expected: Vec<String> = valid.iter().map(usize::to_string).collect();
    Err(CompileError::Arity {
        name: directive.name().to_string(),
        expected: expected.join(" or "),
        found,
        site: None,
    })
}

/// Name-keyed table of print directives, built once at startup.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    directives: BTreeMap<&'static str, Arc<dyn PrintDirective>>,
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.directives.keys()).finish()
    }
}

impl DirectiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding the built-in directive catalog.
    pub fn with_basic_directives() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EscapeUriDirective));
        registry.register(Arc::new(EscapeHtmlDirective));
        registry.register(Arc::new(EscapeJsStringDirective));
        registry.register(Arc::new(NoAutoescapeDirective));
        registry.register(Arc::new(TruncateDirective));
        registry.register(Arc::new(ChangeNewlineToBrDirective));
        registry
    }

    /// Add a directive, replacing any directive of the same name.
    pub fn register(&mut self, directive: Arc<dyn PrintDirective>) {
        self.directives.insert(directive.name(), directive);
    }

    pub fn lookup(&self, name: &str) -> Result<&dyn PrintDirective> {
        self.directives
            .get(name)
            .map(|d| d.as_ref())
            .ok_or_else(|| CompileError::UnknownDirective {
                name: name.to_string(),
                site: None,
            })
    }

    /// Look up the directive a call names and check its argument count.
    pub fn resolve(&self, call: &DirectiveCall) -> Result<&dyn PrintDirective> {
        let directive = self.lookup(&call.name)?;
        check_arity(directive, call.args.len())?;
        Ok(directive)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.directives.keys().copied()
    }
}
