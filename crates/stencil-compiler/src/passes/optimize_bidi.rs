//! Folds bidi helper calls into constants once the text direction is known.

use stencil_tree::{BidiFn, Expr, NodeKind, NodeRef, Tree};

use super::{visit_children_mut, MutatingVisitor};
use crate::bidi::BidiGlobalDir;
use crate::error::Result;
use crate::scope::CallScope;

/// Replaces `bidiGlobalDir()`, `bidiStartEdge()` and `bidiEndEdge()` with
/// literals, using the direction seeded in the call scope.
///
/// Must run inside an open call scope frame.
pub struct OptimizeBidi<'a> {
    scope: &'a CallScope,
    dir: BidiGlobalDir,
    folded: usize,
}

impl<'a> OptimizeBidi<'a> {
    pub fn new(scope: &'a CallScope) -> Self {
        Self {
            scope,
            dir: BidiGlobalDir::Ltr,
            folded: 0,
        }
    }

    pub fn folded(&self) -> usize {
        self.folded
    }

    fn fold(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Bidi(f) => {
                *expr = fold_bidi(*f, self.dir);
                self.folded += 1;
            }
            Expr::Not(inner) => self.fold(inner),
            Expr::Eq(lhs, rhs) => {
                self.fold(lhs);
                self.fold(rhs);
            }
            Expr::Data(_) | Expr::Str(_) | Expr::Number(_) | Expr::Bool(_) => {}
        }
    }
}

/// The constant a bidi helper evaluates to under `dir`.
pub fn fold_bidi(f: BidiFn, dir: BidiGlobalDir) -> Expr {
    match f {
        BidiFn::GlobalDir => Expr::Number(f64::from(dir.to_int())),
        BidiFn::StartEdge => Expr::Str(dir.start_edge().to_string()),
        BidiFn::EndEdge => Expr::Str(dir.end_edge().to_string()),
    }
}

impl MutatingVisitor for OptimizeBidi<'_> {
    fn visit(&mut self, tree: &mut Tree, node: NodeRef) -> Result<()> {
        match tree.kind_mut(node) {
            NodeKind::Print {
                expr, directives, ..
            } => {
                self.fold(expr);
                for call in directives.iter_mut() {
                    for arg in call.args.iter_mut() {
                        self.fold(arg);
                    }
                }
                Ok(())
            }
            NodeKind::IfCond { condition } => {
                self.fold(condition);
                visit_children_mut(self, tree, node)
            }
            _ => visit_children_mut(self, tree, node),
        }
    }

    fn exec(&mut self, tree: &mut Tree) -> Result<()> {
        self.dir = self.scope.bidi_global_dir()?;
        self.folded = 0;
        let root = tree.root();
        self.visit(tree, root)?;
        tracing::debug!(folded = self.folded, dir = ?self.dir, "optimized bidi calls");
        Ok(())
    }
}
