//! Translated message bundles.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stencil_tree::{NodeKind, NodeRef, Tree};

use crate::error::{CompileError, Result};

/// One piece of a translated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgPart {
    /// Literal translated text.
    Text(String),
    /// Reference to a print inside the message, by its expression source
    /// (for example `$name`).
    Placeholder(String),
}

/// Translations for one locale, keyed by message key.
///
/// ```json
/// { "locale": "fr", "messages": { "greeting": [ { "text": "Bonjour " }, { "placeholder": "$name" } ] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgBundle {
    pub locale: String,
    #[serde(default)]
    pub messages: HashMap<String, Vec<MsgPart>>,
}

impl MsgBundle {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            messages: HashMap::new(),
        }
    }

    /// Add a translation, builder style.
    pub fn with_message(mut self, key: impl Into<String>, parts: Vec<MsgPart>) -> Self {
        self.messages.insert(key.into(), parts);
        self
    }

    pub fn get(&self, key: &str) -> Option<&[MsgPart]> {
        self.messages.get(key).map(Vec::as_slice)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Read a bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| CompileError::json(path, e))
    }
}

/// Find the print inside `msg` that a placeholder refers to.
pub fn find_placeholder(tree: &Tree, msg: NodeRef, placeholder: &str) -> Option<NodeRef> {
    tree.descendants(msg).into_iter().skip(1).find(|&n| {
        matches!(tree.kind(n), NodeKind::Print { expr, .. } if expr.to_source_string() == placeholder)
    })
}
