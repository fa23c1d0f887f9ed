//! JavaScript source backend.
//!
//! Each template becomes a function assigned into its namespace object:
//!
//! ```text
//! app.main = function(opt_data, opt_sb) {
//!   var output = opt_sb || new stencil.StringBuilder();
//!   output.append('Hello ', stencil.$$escapeHtml(opt_data.name));
//!   return opt_sb ? '' : output.toString();
//! };
//! ```

use std::path::{Component, Path};

use stencil_tree::{format_number, Expr, NodeKind, NodeRef, Tree};

use super::{apply_directives, file_info, misplaced, unfolded_bidi, Backend, CodeWriter, OutputUnit};
use crate::directives::{BackendKind, DirectiveRegistry, TargetExpr, JS_RUNTIME, MAX_PRECEDENCE};
use crate::error::{CompileError, Result};
use crate::escape::escape_js_string;
use crate::templates::{OverridePolicy, TemplateSet};

const PREC_NOT: u8 = 14;
const PREC_EQUALITY: u8 = 10;

/// Options for JavaScript generation
#[derive(Debug, Clone)]
pub struct JsSrcOptions {
    /// `1` ltr, `-1` rtl, `0` to derive from the bundle's locale.
    pub bidi_global_dir: i32,
    /// Emit `if (typeof ns == 'undefined')` guards for each namespace prefix.
    pub should_declare_namespaces: bool,
    pub override_policy: OverridePolicy,
}

impl Default for JsSrcOptions {
    fn default() -> Self {
        Self {
            bidi_global_dir: 0,
            should_declare_namespaces: true,
            override_policy: OverridePolicy::default(),
        }
    }
}

impl JsSrcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bidi_global_dir(mut self, dir: i32) -> Self {
        self.bidi_global_dir = dir;
        self
    }

    pub fn should_declare_namespaces(mut self, declare: bool) -> Self {
        self.should_declare_namespaces = declare;
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }
}

/// JavaScript code generator
#[derive(Debug, Clone)]
pub struct JsSrcBackend {
    options: JsSrcOptions,
    registry: DirectiveRegistry,
}

impl JsSrcBackend {
    pub fn new(options: JsSrcOptions) -> Self {
        Self::with_registry(options, DirectiveRegistry::with_basic_directives())
    }

    pub fn with_registry(options: JsSrcOptions, registry: DirectiveRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &JsSrcOptions {
        &self.options
    }

    fn declare_namespace(&self, out: &mut CodeWriter, namespace: &str) {
        let mut prefix = String::new();
        for (i, segment) in namespace.split('.').enumerate() {
            if i == 0 {
                prefix.push_str(segment);
                out.line(format!(
                    "if (typeof {0} == 'undefined') {{ var {0} = {{}}; }}",
                    prefix
                ));
            } else {
                prefix.push('.');
                prefix.push_str(segment);
                out.line(format!(
                    "if (typeof {0} == 'undefined') {{ {0} = {{}}; }}",
                    prefix
                ));
            }
        }
    }

    fn emit_template(&self, out: &mut CodeWriter, tree: &Tree, template: NodeRef, name: &str) -> Result<()> {
        out.blank();
        out.line(format!("{} = function(opt_data, opt_sb) {{", name));
        out.indent();
        out.line(format!(
            "var output = opt_sb || new {}.StringBuilder();",
            JS_RUNTIME
        ));
        self.emit_children(out, tree, template)?;
        out.line("return opt_sb ? '' : output.toString();");
        out.dedent();
        out.line("};");
        Ok(())
    }

    fn emit_children(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef) -> Result<()> {
        for &child in tree.children(node) {
            self.emit_node(out, tree, child)?;
        }
        Ok(())
    }

    fn emit_node(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef) -> Result<()> {
        match tree.kind(node) {
            NodeKind::RawText(text) => {
                if !text.is_empty() {
                    out.line(format!("output.append({});", js_string_literal(text)));
                }
            }
            NodeKind::Print {
                expr, directives, ..
            } => {
                let value = self.translate_expr(tree, node, expr)?;
                let value = apply_directives(
                    &self.registry,
                    BackendKind::JsSrc,
                    tree,
                    node,
                    value,
                    directives,
                    |arg| self.translate_expr(tree, node, arg),
                )?;
                out.line(format!("output.append({});", value.text));
            }
            NodeKind::If => self.emit_if(out, tree, node)?,
            // Untranslated message: the source-language content.
            NodeKind::Msg { .. } => self.emit_children(out, tree, node)?,
            NodeKind::Call {
                callee,
                pass_all_data,
            } => {
                let data = if *pass_all_data { "opt_data" } else { "null" };
                out.line(format!("{}({}, output);", callee, data));
            }
            NodeKind::FileSet
            | NodeKind::File { .. }
            | NodeKind::Template { .. }
            | NodeKind::IfCond { .. }
            | NodeKind::IfElse => return Err(misplaced(tree, node)),
        }
        Ok(())
    }

    fn emit_if(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef) -> Result<()> {
        for (i, &branch) in tree.children(node).iter().enumerate() {
            match tree.kind(branch) {
                NodeKind::IfCond { condition } => {
                    let condition = self.translate_expr(tree, branch, condition)?;
                    if i == 0 {
                        out.line(format!("if ({}) {{", condition.text));
                    } else {
                        out.dedent();
                        out.line(format!("}} else if ({}) {{", condition.text));
                    }
                }
                NodeKind::IfElse if i > 0 => {
                    out.dedent();
                    out.line("} else {");
                }
                _ => return Err(misplaced(tree, branch)),
            }
            out.indent();
            self.emit_children(out, tree, branch)?;
        }
        if !tree.children(node).is_empty() {
            out.dedent();
            out.line("}");
        }
        Ok(())
    }

    /// Translate an expression into JavaScript.
    fn translate_expr(&self, tree: &Tree, node: NodeRef, expr: &Expr) -> Result<TargetExpr> {
        let translated = match expr {
            Expr::Data(path) => {
                TargetExpr::new(format!("opt_data.{}", path.join(".")), MAX_PRECEDENCE)
            }
            Expr::Str(s) => TargetExpr::new(js_string_literal(s), MAX_PRECEDENCE),
            Expr::Number(n) => TargetExpr::new(format_number(*n), MAX_PRECEDENCE),
            Expr::Bool(b) => TargetExpr::new(b.to_string(), MAX_PRECEDENCE),
            Expr::Not(inner) => {
                let inner = self.translate_expr(tree, node, inner)?;
                TargetExpr::new(
                    format!("!{}", inner.text_with_min_precedence(PREC_NOT)),
                    PREC_NOT,
                )
            }
            Expr::Eq(lhs, rhs) => {
                let lhs = self.translate_expr(tree, node, lhs)?;
                let rhs = self.translate_expr(tree, node, rhs)?;
                TargetExpr::new(
                    format!(
                        "{} == {}",
                        lhs.text_with_min_precedence(PREC_EQUALITY),
                        rhs.text_with_min_precedence(PREC_EQUALITY + 1)
                    ),
                    PREC_EQUALITY,
                )
            }
            Expr::Bidi(_) => return Err(unfolded_bidi(tree, node, expr)),
        };
        Ok(translated)
    }
}

impl Backend for JsSrcBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::JsSrc
    }

    fn bidi_global_dir(&self) -> i32 {
        self.options.bidi_global_dir
    }

    fn override_policy(&self) -> OverridePolicy {
        self.options.override_policy
    }

    fn emit_file(&self, tree: &Tree, file: NodeRef, templates: &TemplateSet) -> Result<OutputUnit> {
        let (path, namespace) = file_info(tree, file)?;
        let mut out = CodeWriter::new();
        out.line(format!("// This file was automatically generated from {}.", path));
        out.line("// Please don't edit this file by hand.");
        out.blank();

        if self.options.should_declare_namespaces {
            self.declare_namespace(&mut out, namespace);
        }

        for &template in tree.children(file) {
            let NodeKind::Template { name, .. } = tree.kind(template) else {
                return Err(CompileError::codegen(
                    tree.id(template),
                    format!("expected a template, found {}", tree.kind(template).label()),
                ));
            };
            if !templates.is_in_effect(tree, template) {
                tracing::debug!(template = %name, "skipping overridden template");
                continue;
            }
            self.emit_template(&mut out, tree, template, name)?;
        }

        Ok(OutputUnit {
            source_path: path.to_string(),
            file_name: js_file_name(path),
            code: out.finish(),
        })
    }
}

/// Single-quoted JavaScript string literal.
fn js_string_literal(s: &str) -> String {
    format!("'{}'", escape_js_string(s))
}

/// Output path for a source file: its relative directory is kept and the
/// extension becomes `.js`. Root, `.` and `..` components are dropped so the
/// result stays inside the output directory.
fn js_file_name(source_path: &str) -> String {
    let path = Path::new(source_path);
    let mut parts: Vec<&str> = path
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_path);
    let file = format!("{}.js", stem);
    parts.push(&file);
    parts.join("/")
}
