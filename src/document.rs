//! Input documents and iteration contexts.
//!
//! A [`Document`] is the already-parsed object model of one input file: an
//! attribute tree plus the path it came from. Documents are immutable after
//! load and shared read-only (`Arc`) between every unit that touches them.
//!
//! A [`Context`] is what a check or condition is evaluated against: either a
//! single document or a [`DocumentGroup`] of related documents.

use anyhow::{Context as _, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::check::Scope;

/// Parsed object model of one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    path: String,
    attributes: Value,
}

impl Document {
    pub fn new(path: impl Into<String>, attributes: Value) -> Self {
        Self {
            path: path.into(),
            attributes,
        }
    }

    /// Load a document from a JSON or YAML file.
    ///
    /// `.yaml`/`.yml` files are read as YAML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let attributes: Value = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML document {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON document {}", path.display()))?
        };

        if !attributes.is_object() {
            anyhow::bail!(
                "Document {} must contain a mapping at the top level",
                path.display()
            );
        }

        Ok(Self::new(path.display().to_string(), attributes))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    /// Look up an attribute.
    ///
    /// Keys starting with `/` are JSON pointers (`/axes/0/tag`); anything
    /// else is a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key.starts_with('/') {
            self.attributes.pointer(key)
        } else {
            self.attributes.get(key)
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Grouping key for this document, as a string.
    ///
    /// Non-string scalar attributes are rendered with their JSON form so that
    /// numeric keys group too.
    pub fn group_key(&self, attribute: &str) -> Option<String> {
        match self.get(attribute)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// How a group was formed.
///
/// Documents lacking the grouping attribute each form their own group. Their
/// keys live apart from attribute values so that a path can never join a
/// family that happens to share its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Shared value of the grouping attribute
    Attribute(String),
    /// Singleton for the input at `index`, shown by its path
    Ungrouped { index: usize, path: String },
}

impl GroupKey {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &str {
        match self {
            GroupKey::Attribute(value) => value,
            GroupKey::Ungrouped { path, .. } => path,
        }
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        GroupKey::Attribute(value.to_string())
    }
}

/// Related documents sharing a grouping key (e.g. a font family).
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentGroup {
    key: GroupKey,
    documents: Vec<Arc<Document>>,
}

impl DocumentGroup {
    pub fn new(key: impl Into<GroupKey>, documents: Vec<Arc<Document>>) -> Self {
        Self {
            key: key.into(),
            documents,
        }
    }

    /// Label of the group: the attribute value, or the lone document's path.
    pub fn key(&self) -> &str {
        self.key.label()
    }

    pub fn group_key(&self) -> &GroupKey {
        &self.key
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The concrete input a check or condition is evaluated against.
#[derive(Debug, Clone)]
pub enum Context {
    Document(Arc<Document>),
    Group(Arc<DocumentGroup>),
}

impl Context {
    /// Identity used for caching condition results within a run.
    pub fn key(&self) -> String {
        match self {
            Context::Document(doc) => format!("document:{}", doc.path()),
            Context::Group(group) => match group.group_key() {
                GroupKey::Attribute(value) => format!("group:{}", value),
                GroupKey::Ungrouped { index, .. } => format!("ungrouped:{}", index),
            },
        }
    }

    /// Human-readable descriptor used in reports.
    pub fn descriptor(&self) -> &str {
        match self {
            Context::Document(doc) => doc.path(),
            Context::Group(group) => group.key(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Context::Document(_) => Scope::Single,
            Context::Group(_) => Scope::Grouped,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            Context::Document(doc) => Some(doc),
            Context::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&DocumentGroup> {
        match self {
            Context::Document(_) => None,
            Context::Group(group) => Some(group),
        }
    }

    /// Every document reachable from this context.
    pub fn documents(&self) -> &[Arc<Document>] {
        match self {
            Context::Document(doc) => std::slice::from_ref(doc),
            Context::Group(group) => group.documents(),
        }
    }
}
