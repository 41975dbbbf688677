//! Specifications: the frozen, composed registry of sections, checks and
//! conditions.
//!
//! A [`Specification`] is produced once by [`SpecificationBuilder::build`]
//! and is read-only afterwards. Building performs every configuration check
//! up front, in this order:
//!
//! 1. imports are merged (collisions and unknown identifiers fail)
//! 2. local conditions and checks are registered (ids validated, duplicates
//!    fail, clashes with imported identifiers are reported as collisions)
//! 3. every condition reference of every check must resolve
//! 4. the expected-check manifest, if any, must match the resolved ids
//!
//! Nothing in a specification is global: it is a plain value threaded through
//! the runner.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::check::{Check, CheckId};
use crate::condition::Condition;
use crate::errors::{SpecError, SpecResult};
use crate::import::{self, Import};
use crate::manifest::{ExpectedChecks, ManifestDiff};
use crate::section::Section;
use crate::skip::{ProceedAll, SharedSkipFilter, SkipFilter};

/// Default section for checks registered without one.
pub const DEFAULT_SECTION: &str = "Default";

/// Mutable registry used while a specification is being built.
#[derive(Default)]
pub(crate) struct Registry {
    sections: Vec<Section>,
    section_index: HashMap<String, usize>,
    /// Check id -> name of the specification it was imported from (None when local)
    check_origin: HashMap<String, Option<String>>,
    conditions: BTreeMap<String, Arc<Condition>>,
    condition_origin: HashMap<String, Option<String>>,
}

impl Registry {
    fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.section_index.get(name) {
            Some(idx) => *idx,
            None => {
                self.sections.push(Section::new(name));
                let idx = self.sections.len() - 1;
                self.section_index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.sections[idx]
    }

    fn insert_check(
        &mut self,
        section: &str,
        check: Arc<Check>,
        origin: Option<&str>,
    ) -> SpecResult<()> {
        let id = CheckId::parse(check.id())?;

        if let Some(existing) = self.check_origin.get(id.as_str()) {
            // Any clash involving an imported id is an import collision.
            return Err(match (origin, existing) {
                (Some(source), _) => SpecError::ImportCollision {
                    id: id.to_string(),
                    source_spec: source.to_string(),
                },
                (None, Some(source)) => SpecError::ImportCollision {
                    id: id.to_string(),
                    source_spec: source.clone(),
                },
                (None, None) => SpecError::DuplicateCheck { id: id.to_string() },
            });
        }

        self.check_origin
            .insert(id.to_string(), origin.map(str::to_string));
        self.section_mut(section).push(check);
        Ok(())
    }

    fn insert_condition(&mut self, condition: Arc<Condition>, origin: Option<&str>) -> SpecResult<()> {
        let name = condition.name().to_string();

        if let Some(existing) = self.condition_origin.get(&name) {
            return Err(match (origin, existing) {
                (Some(source), _) => SpecError::ImportCollision {
                    id: name,
                    source_spec: source.to_string(),
                },
                (None, Some(source)) => SpecError::ImportCollision {
                    id: name,
                    source_spec: source.clone(),
                },
                (None, None) => SpecError::DuplicateCondition { name },
            });
        }

        self.condition_origin
            .insert(name.clone(), origin.map(str::to_string));
        self.conditions.insert(name, condition);
        Ok(())
    }

    pub(crate) fn import_check(
        &mut self,
        section: &str,
        check: Arc<Check>,
        source: &str,
    ) -> SpecResult<()> {
        self.insert_check(section, check, Some(source))
    }

    pub(crate) fn import_condition(&mut self, condition: Arc<Condition>, source: &str) -> SpecResult<()> {
        self.insert_condition(condition, Some(source))
    }

    fn verify_condition_references(&self) -> SpecResult<()> {
        for section in &self.sections {
            for check in section.checks() {
                for reference in check.conditions() {
                    if !self.conditions.contains_key(reference.name()) {
                        return Err(SpecError::UnknownCondition {
                            check: check.id().to_string(),
                            condition: reference.name().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_ids(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.checks().iter().map(|c| c.id()))
            .collect()
    }
}

/// Builder collecting declarations; all validation happens in [`build`].
///
/// [`build`]: SpecificationBuilder::build
pub struct SpecificationBuilder {
    name: String,
    default_section: String,
    checks: Vec<(Option<String>, Check)>,
    conditions: Vec<Condition>,
    imports: Vec<Import>,
    skip_filter: Option<SharedSkipFilter>,
    expected: Option<ExpectedChecks>,
}

impl SpecificationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_section: DEFAULT_SECTION.to_string(),
            checks: Vec::new(),
            conditions: Vec::new(),
            imports: Vec::new(),
            skip_filter: None,
            expected: None,
        }
    }

    /// Section used by [`check`](Self::check).
    pub fn default_section(mut self, name: impl Into<String>) -> Self {
        self.default_section = name.into();
        self
    }

    /// Register a check in the default section.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push((None, check));
        self
    }

    /// Register a check in a named section.
    pub fn check_in(mut self, section: impl Into<String>, check: Check) -> Self {
        self.checks.push((Some(section.into()), check));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    /// Shorthand for `import(Import::new(source, names))`.
    pub fn import_from<I, S>(self, source: &Specification, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.import(Import::new(source, names))
    }

    pub fn skip_filter<F>(mut self, filter: F) -> Self
    where
        F: SkipFilter + 'static,
    {
        self.skip_filter = Some(Arc::new(filter));
        self
    }

    pub fn expect_checks(mut self, expected: ExpectedChecks) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Resolve imports, validate everything and freeze the specification.
    pub fn build(self) -> SpecResult<Specification> {
        let mut registry = Registry::default();

        for import in &self.imports {
            import::merge(&mut registry, import)?;
        }

        for condition in self.conditions {
            registry.insert_condition(Arc::new(condition), None)?;
        }

        for (section, check) in self.checks {
            let section = section.unwrap_or_else(|| self.default_section.clone());
            registry.insert_check(&section, Arc::new(check), None)?;
        }

        registry.verify_condition_references()?;

        let manifest = match &self.expected {
            Some(expected) => {
                let diff = expected.verify(registry.check_ids());
                if !diff.duplicates.is_empty() {
                    tracing::warn!(
                        specification = %self.name,
                        duplicates = ?diff.duplicates,
                        "expected-check manifest lists ids more than once"
                    );
                }
                diff.clone().into_result()?;
                Some(diff)
            }
            None => None,
        };

        let Registry {
            sections,
            conditions,
            ..
        } = registry;

        tracing::debug!(
            specification = %self.name,
            sections = sections.len(),
            conditions = conditions.len(),
            "specification built"
        );

        Ok(Specification {
            name: self.name,
            sections: Arc::new(sections),
            conditions: Arc::new(conditions),
            skip_filter: self
                .skip_filter
                .unwrap_or_else(|| Arc::new(ProceedAll) as SharedSkipFilter),
            manifest,
        })
    }
}

/// Frozen, composed set of sections, checks and conditions.
#[derive(Clone)]
pub struct Specification {
    name: String,
    sections: Arc<Vec<Section>>,
    conditions: Arc<BTreeMap<String, Arc<Condition>>>,
    skip_filter: SharedSkipFilter,
    manifest: Option<ManifestDiff>,
}

impl Specification {
    pub fn builder(name: impl Into<String>) -> SpecificationBuilder {
        SpecificationBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Arc<Condition>> {
        self.conditions.values()
    }

    pub fn condition(&self, name: &str) -> Option<&Arc<Condition>> {
        self.conditions.get(name)
    }

    /// Find a check and the section holding it.
    pub fn find_check(&self, id: &str) -> Option<(&Section, &Arc<Check>)> {
        self.sections.iter().find_map(|section| {
            section
                .checks()
                .iter()
                .find(|c| c.id() == id)
                .map(|check| (section, check))
        })
    }

    pub fn check(&self, id: &str) -> Option<&Arc<Check>> {
        self.find_check(id).map(|(_, check)| check)
    }

    /// Resolved check ids, in section/declaration order.
    pub fn check_ids(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.checks().iter().map(|c| c.id()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn skip_filter(&self) -> &dyn SkipFilter {
        self.skip_filter.as_ref()
    }

    /// Manifest comparison performed at build time, when one was declared.
    pub fn manifest(&self) -> Option<&ManifestDiff> {
        self.manifest.as_ref()
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("name", &self.name)
            .field("checks", &self.check_ids())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
