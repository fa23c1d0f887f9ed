//! Evaluation of template bodies.
//!
//! Rendering walks a template's children in source order and appends to an
//! output string. The tree is never mutated: messages are resolved against
//! the bundle in the open call scope, and bidi helpers against its direction.

use stencil_compiler::directives::BackendKind;
use stencil_compiler::msgs::find_placeholder;
use stencil_compiler::passes::fold_bidi;
use stencil_compiler::{CallScope, CompileError, DirectiveRegistry, MsgPart, TemplateSet};
use stencil_tree::{Expr, NodeKind, NodeRef, Tree};

use crate::data::TemplateData;
use crate::error::{RenderError, Result};
use crate::value::Value;

/// Calls nested deeper than this are reported instead of overflowing the stack.
const MAX_CALL_DEPTH: usize = 64;

/// Everything one render call reads from.
pub(crate) struct RenderState<'a> {
    pub tree: &'a Tree,
    pub templates: &'a TemplateSet,
    pub registry: &'a DirectiveRegistry,
    pub scope: &'a CallScope,
    depth: usize,
}

impl<'a> RenderState<'a> {
    pub fn new(
        tree: &'a Tree,
        templates: &'a TemplateSet,
        registry: &'a DirectiveRegistry,
        scope: &'a CallScope,
    ) -> Self {
        Self {
            tree,
            templates,
            registry,
            scope,
            depth: 0,
        }
    }
}

/// Render the body of `template` into `out`.
pub(crate) fn render_template(
    state: &mut RenderState<'_>,
    template: NodeRef,
    data: &TemplateData,
    out: &mut String,
) -> Result<()> {
    if state.depth >= MAX_CALL_DEPTH {
        return Err(RenderError::runtime(
            state.tree.id(template),
            format!("call depth exceeds {}", MAX_CALL_DEPTH),
        ));
    }
    state.depth += 1;
    let result = render_children(state, template, data, out);
    state.depth -= 1;
    result
}

fn render_children(
    state: &mut RenderState<'_>,
    node: NodeRef,
    data: &TemplateData,
    out: &mut String,
) -> Result<()> {
    let tree = state.tree;
    for &child in tree.children(node) {
        render_node(state, child, data, out)?;
    }
    Ok(())
}

fn render_node(
    state: &mut RenderState<'_>,
    node: NodeRef,
    data: &TemplateData,
    out: &mut String,
) -> Result<()> {
    let tree = state.tree;
    match tree.kind(node) {
        NodeKind::RawText(text) => out.push_str(text),
        NodeKind::Print { .. } => render_print(state, node, data, out)?,
        NodeKind::If => {
            for (index, &branch) in tree.children(node).iter().enumerate() {
                let taken = match tree.kind(branch) {
                    NodeKind::IfCond { condition } => {
                        eval_expr(condition, data, state.scope)?.to_bool()
                    }
                    NodeKind::IfElse if index > 0 => true,
                    _ => return Err(misplaced(tree, branch)),
                };
                if taken {
                    render_children(state, branch, data, out)?;
                    break;
                }
            }
        }
        NodeKind::Msg { key, .. } => {
            let bundle = state.scope.msg_bundle()?;
            match bundle.as_deref().and_then(|b| b.get(key)) {
                Some(parts) => render_translation(state, node, key, parts, data, out)?,
                None => render_children(state, node, data, out)?,
            }
        }
        NodeKind::Call {
            callee,
            pass_all_data,
        } => {
            let target = state
                .templates
                .get(callee)
                .ok_or_else(|| RenderError::UnknownTemplate(callee.clone()))?;
            if *pass_all_data {
                render_template(state, target, data, out)?;
            } else {
                render_template(state, target, &TemplateData::new(), out)?;
            }
        }
        NodeKind::FileSet
        | NodeKind::File { .. }
        | NodeKind::Template { .. }
        | NodeKind::IfCond { .. }
        | NodeKind::IfElse => return Err(misplaced(tree, node)),
    }
    Ok(())
}

fn render_translation(
    state: &mut RenderState<'_>,
    msg: NodeRef,
    key: &str,
    parts: &[MsgPart],
    data: &TemplateData,
    out: &mut String,
) -> Result<()> {
    for part in parts {
        match part {
            MsgPart::Text(text) => out.push_str(text),
            MsgPart::Placeholder(name) => {
                let print = find_placeholder(state.tree, msg, name).ok_or_else(|| {
                    RenderError::runtime(
                        state.tree.id(msg),
                        format!("translation of message '{}' uses unknown placeholder {}", key, name),
                    )
                })?;
                render_print(state, print, data, out)?;
            }
        }
    }
    Ok(())
}

/// Evaluate a print site and apply its directives in order.
fn render_print(
    state: &mut RenderState<'_>,
    node: NodeRef,
    data: &TemplateData,
    out: &mut String,
) -> Result<()> {
    let tree = state.tree;
    let NodeKind::Print {
        expr, directives, ..
    } = tree.kind(node)
    else {
        return Err(misplaced(tree, node));
    };

    let value = eval_expr(expr, data, state.scope)?;
    if value.is_null() {
        return Err(RenderError::runtime(
            tree.id(node),
            format!(
                "expression {} in {} evaluates to null",
                expr.to_source_string(),
                tree.to_source_string(node)
            ),
        ));
    }

    let mut text = value.to_string_value();
    for call in directives {
        let directive = state
            .registry
            .resolve(call)
            .map_err(|e| e.at_site(tree.to_source_string(node)))?;
        let interpreted =
            directive
                .interpreted()
                .ok_or_else(|| CompileError::UnsupportedDirectiveForBackend {
                    directive: call.name.clone(),
                    backend: BackendKind::Interpreter.to_string(),
                    node_id: tree.id(node).to_string(),
                })?;
        let args = call
            .args
            .iter()
            .map(|arg| eval_expr(arg, data, state.scope).map(|v| v.to_json_value()))
            .collect::<Result<Vec<_>>>()?;
        text = interpreted
            .apply_for_interpreter(&text, &args)
            .map_err(|e| RenderError::runtime(tree.id(node), e.to_string()))?;
    }
    out.push_str(&text);
    Ok(())
}

/// Evaluate an expression against the render data and the open call scope.
pub fn eval_expr(expr: &Expr, data: &TemplateData, scope: &CallScope) -> Result<Value> {
    let value = match expr {
        Expr::Data(path) => data.get_path(path).cloned().unwrap_or_default(),
        Expr::Str(s) => Value::String(s.clone()),
        Expr::Number(n) => Value::Number(*n),
        Expr::Bool(b) => Value::Boolean(*b),
        Expr::Not(inner) => Value::Boolean(!eval_expr(inner, data, scope)?.to_bool()),
        Expr::Eq(lhs, rhs) => {
            let lhs = eval_expr(lhs, data, scope)?;
            let rhs = eval_expr(rhs, data, scope)?;
            Value::Boolean(lhs.loose_eq(&rhs))
        }
        Expr::Bidi(f) => {
            let folded = fold_bidi(*f, scope.bidi_global_dir()?);
            eval_expr(&folded, data, scope)?
        }
    };
    Ok(value)
}

fn misplaced(tree: &Tree, node: NodeRef) -> RenderError {
    RenderError::runtime(
        tree.id(node),
        format!("unexpected {} inside a template body", tree.kind(node).label()),
    )
}
