/// Resolution of the template set every backend renders from

use std::collections::HashMap;

use stencil_tree::{is_partial_name, NodeKind, NodeRef, Tree};

use crate::error::{CompileError, Result};

/// Which definition wins when a template is explicitly overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// The first definition in file-set order stays.
    KeepFirst,
    /// Each later override replaces the earlier definition.
    #[default]
    KeepLast,
}

/// Full template name to the definition that is in effect.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    by_name: HashMap<String, NodeRef>,
    /// Winning templates in file-set order of their first definition.
    order: Vec<String>,
}

impl TemplateSet {
    /// Walk every file's templates and pick the winner of each name.
    ///
    /// Names must already be fully qualified. Duplicate detection is
    /// `CheckOverrides`' job; here a repeated name is simply resolved by
    /// `policy`.
    pub fn resolve(tree: &Tree, policy: OverridePolicy) -> Result<Self> {
        let mut set = TemplateSet::default();
        for &file in tree.files() {
            for &template in tree.children(file) {
                let NodeKind::Template { name, .. } = tree.kind(template) else {
                    continue;
                };
                if is_partial_name(name) {
                    return Err(CompileError::PartialTemplateName(name.clone()));
                }
                match set.by_name.get_mut(name) {
                    Some(existing) => {
                        if policy == OverridePolicy::KeepLast {
                            *existing = template;
                        }
                    }
                    None => {
                        set.by_name.insert(name.clone(), template);
                        set.order.push(name.clone());
                    }
                }
            }
        }
        tracing::debug!(templates = set.len(), ?policy, "resolved template set");
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<NodeRef> {
        self.by_name.get(name).copied()
    }

    /// Whether `template` is the definition in effect for its name.
    pub fn is_in_effect(&self, tree: &Tree, template: NodeRef) -> bool {
        match tree.kind(template) {
            NodeKind::Template { name, .. } => self.get(name) == Some(template),
            _ => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overridden() -> (Tree, NodeRef, NodeRef) {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree
            .add(root, NodeKind::File { path: "a.stn".into(), namespace: "app".into() })
            .unwrap();
        let first = tree.add(a, NodeKind::template("app.main")).unwrap();
        tree.add(a, NodeKind::template("app.other")).unwrap();
        let b = tree
            .add(root, NodeKind::File { path: "b.stn".into(), namespace: "app".into() })
            .unwrap();
        let second = tree
            .add(
                b,
                NodeKind::Template {
                    name: "app.main".into(),
                    is_override: true,
                    autoescape: true,
                },
            )
            .unwrap();
        (tree, first, second)
    }

    #[test]
    fn test_keep_last_by_default() {
        let (tree, first, second) = overridden();
        let set = TemplateSet::resolve(&tree, OverridePolicy::default()).unwrap();

        assert_eq!(set.get("app.main"), Some(second));
        assert!(!set.is_in_effect(&tree, first));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["app.main", "app.other"]);
    }

    #[test]
    fn test_keep_first() {
        let (tree, first, second) = overridden();
        let set = TemplateSet::resolve(&tree, OverridePolicy::KeepFirst).unwrap();

        assert_eq!(set.get("app.main"), Some(first));
        assert!(!set.is_in_effect(&tree, second));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_partial_name_rejected() {
        let mut tree = Tree::new();
        let root = tree.root();
        let f = tree
            .add(root, NodeKind::File { path: "a.stn".into(), namespace: "app".into() })
            .unwrap();
        tree.add(f, NodeKind::template(".main")).unwrap();

        let err = TemplateSet::resolve(&tree, OverridePolicy::KeepLast).unwrap_err();
        assert!(matches!(err, CompileError::PartialTemplateName(ref n) if n == ".main"));
    }
}
