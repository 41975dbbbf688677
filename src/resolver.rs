//! Expansion of a specification over concrete inputs into execution units.
//!
//! Single-scope checks get one unit per document; grouped checks get one unit
//! per document group. Documents are grouped by a shared attribute (the font
//! family name by default); a document lacking the attribute forms a group of
//! its own, keyed by its path.
//!
//! Unit order is fully determined by the specification and the inputs:
//! sections in declaration order, checks in declaration order, then contexts
//! in input order (groups ordered by the first appearance of their key).

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::check::{Check, Scope};
use crate::document::{Context, Document, DocumentGroup, GroupKey};
use crate::specification::Specification;

/// Attribute used to group documents into families when none is configured.
pub const DEFAULT_GROUP_ATTRIBUTE: &str = "family_name";

/// The concrete input set of a run.
#[derive(Debug, Clone)]
pub struct Inputs {
    documents: Vec<Arc<Document>>,
    group_by: String,
}

impl Inputs {
    pub fn new(documents: Vec<Document>) -> Self {
        Self::from_shared(documents.into_iter().map(Arc::new).collect())
    }

    pub fn from_shared(documents: Vec<Arc<Document>>) -> Self {
        Self {
            documents,
            group_by: DEFAULT_GROUP_ATTRIBUTE.to_string(),
        }
    }

    /// Load every path as a document, failing on the first unreadable one.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let documents = paths
            .iter()
            .map(|p| Document::load(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(documents))
    }

    /// Group documents by `attribute` instead of the default.
    pub fn group_by(mut self, attribute: impl Into<String>) -> Self {
        self.group_by = attribute.into();
        self
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn group_attribute(&self) -> &str {
        &self.group_by
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Partition the documents into groups, in order of first appearance.
    ///
    /// A document without the grouping attribute forms a singleton group of
    /// its own; it never joins a family whose name equals its path.
    pub fn groups(&self) -> Vec<Arc<DocumentGroup>> {
        let mut order: Vec<GroupKey> = Vec::new();
        let mut members: HashMap<GroupKey, Vec<Arc<Document>>> = HashMap::new();

        for (index, doc) in self.documents.iter().enumerate() {
            let key = match doc.group_key(&self.group_by) {
                Some(value) => GroupKey::Attribute(value),
                None => GroupKey::Ungrouped {
                    index,
                    path: doc.path().to_string(),
                },
            };
            let entry = members.entry(key.clone()).or_default();
            if entry.is_empty() {
                order.push(key);
            }
            entry.push(Arc::clone(doc));
        }

        order
            .into_iter()
            .filter_map(|key| {
                let docs = members.remove(&key)?;
                Some(Arc::new(DocumentGroup::new(key, docs)))
            })
            .collect()
    }
}

/// Include/exclude filters over check ids (substring match).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn admits(&self, check_id: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|p| check_id.contains(p.as_str()));
        let excluded = self.exclude.iter().any(|p| check_id.contains(p.as_str()));
        included && !excluded
    }
}

/// One (check, context) pairing to be executed.
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    /// Position in resolver order; reports are sorted by it
    pub index: usize,
    pub section: String,
    pub check: Arc<Check>,
    pub context: Context,
}

/// Expand a specification over the inputs.
pub fn expand(spec: &Specification, inputs: &Inputs, selection: &Selection) -> Vec<ExecutionUnit> {
    let singles: Vec<Context> = inputs
        .documents()
        .iter()
        .map(|doc| Context::Document(Arc::clone(doc)))
        .collect();
    let groups: Vec<Context> = inputs.groups().into_iter().map(Context::Group).collect();

    let mut units = Vec::new();
    for section in spec.sections() {
        for check in section.checks() {
            if !selection.admits(check.id()) {
                continue;
            }
            let contexts = match check.scope() {
                Scope::Single => &singles,
                Scope::Grouped => &groups,
            };
            for context in contexts {
                units.push(ExecutionUnit {
                    index: units.len(),
                    section: section.name().to_string(),
                    check: Arc::clone(check),
                    context: context.clone(),
                });
            }
        }
    }

    tracing::debug!(
        specification = spec.name(),
        documents = inputs.documents().len(),
        groups = groups.len(),
        units = units.len(),
        "expanded execution units"
    );
    units
}
