//! Typed views over the font attribute model used by the builtin checks.
//!
//! A font document is a mapping such as:
//!
//! ```yaml
//! family_name: Source Sans
//! style_name: Regular
//! font_version: "3.006"
//! units_per_em: 1000
//! name_records:
//!   - { platform_id: 3, encoding_id: 1, language_id: 1033, name_id: 1, string: Source Sans }
//! axes:
//!   - { tag: wght, min: 200, default: 400, max: 900 }
//! named_instances:
//!   - { name: Regular, coordinates: { wght: 400 } }
//! ligatures: [[f, i], [f, l]]
//! ligature_carets: [[f, i]]
//! kerning_pairs: [[f, i]]
//! ```

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::document::{Context, Document};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NameRecord {
    #[serde(default)]
    pub platform_id: u16,
    #[serde(default)]
    pub encoding_id: u16,
    #[serde(default)]
    pub language_id: u16,
    pub name_id: u16,
    #[serde(default)]
    pub string: String,
}

impl NameRecord {
    /// (platform, encoding, language, name id) tuple identifying the record.
    pub fn key(&self) -> (u16, u16, u16, u16) {
        (self.platform_id, self.encoding_id, self.language_id, self.name_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Axis {
    pub tag: String,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub default: f64,
    #[serde(default)]
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedInstance {
    pub name: String,
    #[serde(default)]
    pub coordinates: BTreeMap<String, f64>,
}

/// Ligature described by its component glyph names.
pub type Ligature = Vec<String>;

fn typed<T: DeserializeOwned>(doc: &Document, key: &str) -> Result<Option<T>> {
    doc.get(key)
        .map(|value| {
            serde_json::from_value(value.clone())
                .with_context(|| format!("malformed '{}' in {}", key, doc.path()))
        })
        .transpose()
}

/// The single document a single-scope check runs against.
pub fn single(context: &Context) -> Result<&Document> {
    context
        .document()
        .with_context(|| format!("expected a single document, got group '{}'", context.descriptor()))
}

pub fn name_records(doc: &Document) -> Result<Vec<NameRecord>> {
    typed(doc, "name_records")?.with_context(|| format!("{} has no name table", doc.path()))
}

pub fn has_name_table(doc: &Document) -> bool {
    doc.get_array("name_records").is_some()
}

pub fn axes(doc: &Document) -> Result<Vec<Axis>> {
    Ok(typed(doc, "axes")?.unwrap_or_default())
}

pub fn named_instances(doc: &Document) -> Result<Vec<NamedInstance>> {
    Ok(typed(doc, "named_instances")?.unwrap_or_default())
}

pub fn ligatures(doc: &Document, key: &str) -> Result<Vec<Ligature>> {
    Ok(typed(doc, key)?.unwrap_or_default())
}

pub fn units_per_em(doc: &Document) -> Result<u64> {
    doc.get_u64("units_per_em")
        .with_context(|| format!("{} has no head.unitsPerEm", doc.path()))
}

/// Directory holding the document, as given on the command line.
pub fn directory(doc: &Document) -> String {
    Path::new(doc.path())
        .parent()
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string())
}
