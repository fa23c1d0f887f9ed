//! Java source backend.
//!
//! A file's namespace becomes a final class; each template becomes a static
//! method appending to a `StringBuilder`. Namespace `app.ui` maps to class
//! `UiTemplates` in package `app`, unless a package is configured.

use stencil_tree::{format_number, Expr, NodeKind, NodeRef, Tree};

use super::{apply_directives, file_info, misplaced, unfolded_bidi, Backend, CodeWriter, OutputUnit};
use crate::directives::{BackendKind, DirectiveRegistry, TargetExpr, JAVA_UTILS, MAX_PRECEDENCE};
use crate::error::{CompileError, Result};
use crate::templates::{OverridePolicy, TemplateSet};

const PREC_NOT: u8 = 14;

/// Options for Java generation
#[derive(Debug, Clone, Default)]
pub struct JavaSrcOptions {
    /// `1` ltr, `-1` rtl, `0` to derive from the bundle's locale.
    pub bidi_global_dir: i32,
    /// Package for every generated class. Defaults to the namespace prefix.
    pub package: Option<String>,
    pub override_policy: OverridePolicy,
}

impl JavaSrcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bidi_global_dir(mut self, dir: i32) -> Self {
        self.bidi_global_dir = dir;
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }
}

/// Java code generator
#[derive(Debug, Clone)]
pub struct JavaSrcBackend {
    options: JavaSrcOptions,
    registry: DirectiveRegistry,
}

impl JavaSrcBackend {
    pub fn new(options: JavaSrcOptions) -> Self {
        Self::with_registry(options, DirectiveRegistry::with_basic_directives())
    }

    pub fn with_registry(options: JavaSrcOptions, registry: DirectiveRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &JavaSrcOptions {
        &self.options
    }

    fn package_for(&self, namespace: &str) -> Option<String> {
        if let Some(package) = &self.options.package {
            return Some(package.clone());
        }
        namespace
            .rsplit_once('.')
            .map(|(prefix, _)| prefix.to_string())
    }

    /// Fully qualified class for a namespace.
    fn qualified_class(&self, namespace: &str) -> String {
        match self.package_for(namespace) {
            Some(package) => format!("{}.{}", package, class_name(namespace)),
            None => class_name(namespace),
        }
    }

    fn emit_template(&self, out: &mut CodeWriter, tree: &Tree, template: NodeRef, name: &str, namespace: &str) -> Result<()> {
        out.blank();
        out.line(format!(
            "public static void {}(Map<String, Object> data, StringBuilder sb) {{",
            method_name(name)
        ));
        out.indent();
        self.emit_children(out, tree, template, namespace)?;
        out.dedent();
        out.line("}");
        Ok(())
    }

    fn emit_children(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef, namespace: &str) -> Result<()> {
        for &child in tree.children(node) {
            self.emit_node(out, tree, child, namespace)?;
        }
        Ok(())
    }

    fn emit_node(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef, namespace: &str) -> Result<()> {
        match tree.kind(node) {
            NodeKind::RawText(text) => {
                if !text.is_empty() {
                    out.line(format!("sb.append({});", java_string_literal(text)));
                }
            }
            NodeKind::Print {
                expr, directives, ..
            } => {
                let value = self.translate_expr(tree, node, expr)?;
                let value = TargetExpr::call(&java_helper("coerceToString"), &[&value]);
                let value = apply_directives(
                    &self.registry,
                    BackendKind::JavaSrc,
                    tree,
                    node,
                    value,
                    directives,
                    |arg| self.translate_expr(tree, node, arg),
                )?;
                out.line(format!("sb.append({});", value.text));
            }
            NodeKind::If => self.emit_if(out, tree, node, namespace)?,
            NodeKind::Msg { .. } => self.emit_children(out, tree, node, namespace)?,
            NodeKind::Call {
                callee,
                pass_all_data,
            } => {
                let data = if *pass_all_data { "data" } else { "null" };
                let target = match callee.rsplit_once('.') {
                    Some((callee_ns, _)) if callee_ns != namespace => {
                        format!("{}.{}", self.qualified_class(callee_ns), method_name(callee))
                    }
                    _ => method_name(callee).to_string(),
                };
                out.line(format!("{}({}, sb);", target, data));
            }
            NodeKind::FileSet
            | NodeKind::File { .. }
            | NodeKind::Template { .. }
            | NodeKind::IfCond { .. }
            | NodeKind::IfElse => return Err(misplaced(tree, node)),
        }
        Ok(())
    }

    fn emit_if(&self, out: &mut CodeWriter, tree: &Tree, node: NodeRef, namespace: &str) -> Result<()> {
        for (i, &branch) in tree.children(node).iter().enumerate() {
            match tree.kind(branch) {
                NodeKind::IfCond { condition } => {
                    let condition = self.translate_expr(tree, branch, condition)?;
                    let test = TargetExpr::call(&java_helper("coerceToBoolean"), &[&condition]);
                    if i == 0 {
                        out.line(format!("if ({}) {{", test.text));
                    } else {
                        out.dedent();
                        out.line(format!("}} else if ({}) {{", test.text));
                    }
                }
                NodeKind::IfElse if i > 0 => {
                    out.dedent();
                    out.line("} else {");
                }
                _ => return Err(misplaced(tree, branch)),
            }
            out.indent();
            self.emit_children(out, tree, branch, namespace)?;
        }
        if !tree.children(node).is_empty() {
            out.dedent();
            out.line("}");
        }
        Ok(())
    }

    /// Translate an expression into a Java expression of type `Object`.
    fn translate_expr(&self, tree: &Tree, node: NodeRef, expr: &Expr) -> Result<TargetExpr> {
        let translated = match expr {
            Expr::Data(path) => {
                let key = TargetExpr::new(java_string_literal(&path.join(".")), MAX_PRECEDENCE);
                let data = TargetExpr::new("data", MAX_PRECEDENCE);
                TargetExpr::call(&java_helper("getData"), &[&data, &key])
            }
            Expr::Str(s) => TargetExpr::new(java_string_literal(s), MAX_PRECEDENCE),
            Expr::Number(n) => TargetExpr::new(format_number(*n), MAX_PRECEDENCE),
            Expr::Bool(b) => TargetExpr::new(b.to_string(), MAX_PRECEDENCE),
            Expr::Not(inner) => {
                let inner = self.translate_expr(tree, node, inner)?;
                let test = TargetExpr::call(&java_helper("coerceToBoolean"), &[&inner]);
                TargetExpr::new(format!("!{}", test.text_with_min_precedence(PREC_NOT)), PREC_NOT)
            }
            Expr::Eq(lhs, rhs) => {
                let lhs = self.translate_expr(tree, node, lhs)?;
                let rhs = self.translate_expr(tree, node, rhs)?;
                TargetExpr::call(&java_helper("equals"), &[&lhs, &rhs])
            }
            Expr::Bidi(_) => return Err(unfolded_bidi(tree, node, expr)),
        };
        Ok(translated)
    }
}

impl Backend for JavaSrcBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::JavaSrc
    }

    fn bidi_global_dir(&self) -> i32 {
        self.options.bidi_global_dir
    }

    fn override_policy(&self) -> OverridePolicy {
        self.options.override_policy
    }

    fn emit_file(&self, tree: &Tree, file: NodeRef, templates: &TemplateSet) -> Result<OutputUnit> {
        let (path, namespace) = file_info(tree, file)?;
        let class = class_name(namespace);

        let mut out = CodeWriter::new();
        out.line(format!("// This file was automatically generated from {}.", path));
        out.line("// Please don't edit this file by hand.");
        out.blank();
        if let Some(package) = self.package_for(namespace) {
            out.line(format!("package {};", package));
            out.blank();
        }
        out.line("import java.util.Map;");
        out.blank();
        out.line(format!("public final class {} {{", class));
        out.indent();
        out.line(format!("private {}() {{}}", class));

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
            self.emit_template(&mut out, tree, template, name, namespace)?;
        }

        out.dedent();
        out.line("}");

        Ok(OutputUnit {
            source_path: path.to_string(),
            file_name: java_file_name(self.package_for(namespace).as_deref(), &class),
            code: out.finish(),
        })
    }
}

fn java_helper(name: &str) -> String {
    format!("{}.$${}", JAVA_UTILS, name)
}

/// Class name for a namespace: `app.user_profile` -> `UserProfileTemplates`.
fn class_name(namespace: &str) -> String {
    let last = namespace.rsplit('.').next().unwrap_or(namespace);
    let mut class = String::with_capacity(last.len() + 9);
    for part in last.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            class.extend(first.to_uppercase());
            class.push_str(chars.as_str());
        }
    }
    class.push_str("Templates");
    class
}

/// Output path for a class, under its package directories.
fn java_file_name(package: Option<&str>, class: &str) -> String {
    match package {
        Some(package) => format!("{}/{}.java", package.replace('.', "/"), class),
        None => format!("{}.java", class),
    }
}

/// Method name for a full template name: the segment after the last `.`.
fn method_name(template: &str) -> &str {
    template.rsplit('.').next().unwrap_or(template)
}

/// Double-quoted Java string literal.
fn java_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
