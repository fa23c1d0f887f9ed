//! Loading a tree from a JSON description of a file set.
//!
//! The textual grammar lives outside this crate; this JSON form is the
//! boundary through which already-parsed templates enter the toolchain.
//!
//! ```json
//! { "files": [ { "path": "a.stn", "namespace": "app", "templates": [
//!     { "name": ".main", "body": [
//!         { "kind": "text", "text": "Hello " },
//!         { "kind": "print", "expr": { "data": ["name"] } } ] } ] } ] }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::ast::{DirectiveCall, EscapeContext, Expr, NodeKind};
use crate::error::{Result, TreeError};
use crate::tree::{NodeRef, Tree};

#[derive(Debug, Deserialize)]
struct FileSetDesc {
    files: Vec<FileDesc>,
}

#[derive(Debug, Deserialize)]
struct FileDesc {
    path: String,
    namespace: String,
    #[serde(default)]
    templates: Vec<TemplateDesc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TemplateDesc {
    name: String,
    #[serde(default, rename = "override")]
    is_override: bool,
    #[serde(default = "default_true")]
    autoescape: bool,
    #[serde(default)]
    body: Vec<BodyDesc>,
}

#[derive(Debug, Deserialize)]
struct BranchDesc {
    condition: Expr,
    #[serde(default)]
    body: Vec<BodyDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BodyDesc {
    Text {
        text: String,
    },
    Print {
        expr: Expr,
        #[serde(default)]
        directives: Vec<DirectiveCall>,
        #[serde(default)]
        escape: Option<EscapeContext>,
    },
    If {
        branches: Vec<BranchDesc>,
        #[serde(default)]
        else_body: Option<Vec<BodyDesc>>,
    },
    Msg {
        key: String,
        #[serde(default)]
        desc: String,
        #[serde(default)]
        body: Vec<BodyDesc>,
    },
    Call {
        callee: String,
        #[serde(default)]
        data_all: bool,
    },
}

/// Build a tree from a JSON file-set description.
pub fn load_str(json: &str) -> Result<Tree> {
    let desc: FileSetDesc = serde_json::from_str(json)?;
    let mut tree = Tree::new();
    let root = tree.root();
    for file in desc.files {
        let file_node = tree.add(
            root,
            NodeKind::File {
                path: file.path,
                namespace: file.namespace,
            },
        )?;
        for template in file.templates {
            let template_node = tree.add(
                file_node,
                NodeKind::Template {
                    name: template.name,
                    is_override: template.is_override,
                    autoescape: template.autoescape,
                },
            )?;
            add_body(&mut tree, template_node, template.body)?;
        }
    }
    Ok(tree)
}

/// Read and load a JSON file-set description from disk.
pub fn load_file(path: impl AsRef<Path>) -> Result<Tree> {
    let json = std::fs::read_to_string(path)?;
    load_str(&json)
}

fn add_body(tree: &mut Tree, parent: NodeRef, body: Vec<BodyDesc>) -> Result<()> {
    for item in body {
        match item {
            BodyDesc::Text { text } => {
                tree.add(parent, NodeKind::RawText(text))?;
            }
            BodyDesc::Print {
                expr,
                directives,
                escape,
            } => {
                tree.add(
                    parent,
                    NodeKind::Print {
                        expr,
                        directives,
                        escape,
                    },
                )?;
            }
            BodyDesc::If {
                branches,
                else_body,
            } => {
                if branches.is_empty() {
                    return Err(TreeError::invalid(
                        tree.id(parent),
                        "an if needs at least one condition branch",
                    ));
                }
                let if_node = tree.add(parent, NodeKind::If)?;
                for branch in branches {
                    let cond = tree.add(
                        if_node,
                        NodeKind::IfCond {
                            condition: branch.condition,
                        },
                    )?;
                    add_body(tree, cond, branch.body)?;
                }
                if let Some(else_body) = else_body {
                    let else_node = tree.add(if_node, NodeKind::IfElse)?;
                    add_body(tree, else_node, else_body)?;
                }
            }
            BodyDesc::Msg { key, desc, body } => {
                let msg = tree.add(parent, NodeKind::Msg { key, desc })?;
                add_body(tree, msg, body)?;
            }
            BodyDesc::Call { callee, data_all } => {
                tree.add(
                    parent,
                    NodeKind::Call {
                        callee,
                        pass_all_data: data_all,
                    },
                )?;
            }
        }
    }
    Ok(())
}
