//! Node kinds and expressions carried by tree nodes.

use serde::{Deserialize, Serialize};

/// The kind of a tree node, together with the literal data it carries.
///
/// Structure (parent, children, identity) lives in [`crate::Tree`]; this enum
/// only describes what a single node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of a compilation: one child per input file.
    FileSet,
    /// One source file: `{namespace ns}` followed by its templates.
    File { path: String, namespace: String },
    /// A named template. `is_override` only matters in legacy override mode.
    Template {
        name: String,
        is_override: bool,
        autoescape: bool,
    },
    /// Literal text copied to the output.
    RawText(String),
    /// Print site: `{$x |dir1 |dir2:arg}`.
    Print {
        expr: Expr,
        directives: Vec<DirectiveCall>,
        /// Output context requiring escaping, set by context analysis.
        escape: Option<EscapeContext>,
    },
    /// Conditional block; children are `IfCond` nodes optionally ending in `IfElse`.
    If,
    /// `{if cond}` or `{elseif cond}` branch.
    IfCond { condition: Expr },
    /// `{else}` branch.
    IfElse,
    /// Translatable message; children are the source-language content.
    Msg { key: String, desc: String },
    /// Call of another template, optionally passing all of the caller's data.
    Call { callee: String, pass_all_data: bool },
}

impl NodeKind {
    /// Whether nodes of this kind may own children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::FileSet
                | NodeKind::File { .. }
                | NodeKind::Template { .. }
                | NodeKind::If
                | NodeKind::IfCond { .. }
                | NodeKind::IfElse
                | NodeKind::Msg { .. }
        )
    }

    /// Short human-readable label used in dumps and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::FileSet => "FileSet",
            NodeKind::File { .. } => "File",
            NodeKind::Template { .. } => "Template",
            NodeKind::RawText(_) => "RawText",
            NodeKind::Print { .. } => "Print",
            NodeKind::If => "If",
            NodeKind::IfCond { .. } => "IfCond",
            NodeKind::IfElse => "IfElse",
            NodeKind::Msg { .. } => "Msg",
            NodeKind::Call { .. } => "Call",
        }
    }

    pub fn template(name: impl Into<String>) -> Self {
        NodeKind::Template {
            name: name.into(),
            is_override: false,
            autoescape: true,
        }
    }

    pub fn print(expr: Expr) -> Self {
        NodeKind::Print {
            expr,
            directives: Vec::new(),
            escape: None,
        }
    }
}

/// Output context of a print site, used to pick the default escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeContext {
    Html,
    JsString,
    Uri,
}

impl EscapeContext {
    /// Name of the directive that performs this context's default escape.
    pub fn default_directive(&self) -> &'static str {
        match self {
            EscapeContext::Html => "|escapeHtml",
            EscapeContext::JsString => "|escapeJsString",
            EscapeContext::Uri => "|escapeUri",
        }
    }
}

/// A print directive applied at a print site: `|truncate:8,false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl DirectiveCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn to_source_string(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self.args.iter().map(Expr::to_source_string).collect();
        format!("{}:{}", self.name, args.join(","))
    }
}

/// Bidi helper functions whose value depends on the global text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidiFn {
    /// `bidiGlobalDir()`: 1 or -1.
    GlobalDir,
    /// `bidiStartEdge()`: "left" or "right".
    StartEdge,
    /// `bidiEndEdge()`: "right" or "left".
    EndEdge,
}

impl BidiFn {
    pub fn source_name(&self) -> &'static str {
        match self {
            BidiFn::GlobalDir => "bidiGlobalDir",
            BidiFn::StartEdge => "bidiStartEdge",
            BidiFn::EndEdge => "bidiEndEdge",
        }
    }
}

/// Expression carried by print, condition and directive-argument positions.
///
/// This is a deliberately small language: data references, literals and a
/// couple of operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Data reference: `$user.name`
    Data(Vec<String>),
    /// String literal: `'text'`
    Str(String),
    /// Number literal
    Number(f64),
    /// Boolean literal
    Bool(bool),
    /// `not expr`
    Not(Box<Expr>),
    /// `a == b`
    Eq(Box<Expr>, Box<Expr>),
    /// Call of a bidi helper
    Bidi(BidiFn),
}

impl Expr {
    /// Build a data reference from a dotted path: `Expr::data("user.name")`.
    pub fn data(path: &str) -> Self {
        Expr::Data(path.split('.').map(str::to_string).collect())
    }

    pub fn to_source_string(&self) -> String {
        match self {
            Expr::Data(path) => format!("${}", path.join(".")),
            Expr::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Expr::Number(n) => format_number(*n),
            Expr::Bool(b) => b.to_string(),
            Expr::Not(inner) => format!("not {}", inner.to_source_string()),
            Expr::Eq(lhs, rhs) => {
                format!("{} == {}", lhs.to_source_string(), rhs.to_source_string())
            }
            Expr::Bidi(f) => format!("{}()", f.source_name()),
        }
    }
}

/// Format a number the way template source writes it (integers without `.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_source() {
        assert_eq!(Expr::data("user.name").to_source_string(), "$user.name");
        assert_eq!(Expr::Str("it's".into()).to_source_string(), "'it\\'s'");
        assert_eq!(Expr::Number(3.0).to_source_string(), "3");
        assert_eq!(Expr::Number(2.5).to_source_string(), "2.5");
        assert_eq!(
            Expr::Not(Box::new(Expr::data("x"))).to_source_string(),
            "not $x"
        );
        assert_eq!(Expr::Bidi(BidiFn::StartEdge).to_source_string(), "bidiStartEdge()");
    }

    #[test]
    fn test_directive_call_source() {
        assert_eq!(DirectiveCall::new("|escapeUri").to_source_string(), "|escapeUri");
        let call = DirectiveCall::with_args(
            "|truncate",
            vec![Expr::Number(8.0), Expr::Bool(false)],
        );
        assert_eq!(call.to_source_string(), "|truncate:8,false");
    }

    #[test]
    fn test_default_directive_per_context() {
        assert_eq!(EscapeContext::Html.default_directive(), "|escapeHtml");
        assert_eq!(EscapeContext::Uri.default_directive(), "|escapeUri");
    }
}
