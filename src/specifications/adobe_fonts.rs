//! Checks for Adobe Fonts (formerly known as Typekit).
//!
//! Composed from the `general` specification plus two checks of its own,
//! with an exclusive manifest pinning the resolved check set.

use std::collections::BTreeSet;

use crate::check::Check;
use crate::document::Context;
use crate::errors::SpecResult;
use crate::event::{verdicts, Verdict, Verdicts};
use crate::manifest::ExpectedChecks;
use crate::skip::SkipDecision;
use crate::specification::{Specification, SpecificationBuilder};

use super::font::{self, single};
use super::general;

pub const NAME: &str = "adobe_fonts";
pub const DEFAULT_SECTION: &str = "Adobe Fonts";

pub const NAME_EMPTY_RECORDS: &str = "com.adobe.fonts/check/name/empty_records";
pub const CONSISTENT_UPM: &str = "com.adobe.fonts/check/consistent_upm";

/// Sections pulled in whole from `general`.
const IMPORTED_SECTIONS: &[&str] = &["general", "head", "name", "gdef", "gpos", "fvar"];

/// Checks that only make sense across a family and are refused for a single font.
const FAMILY_ONLY: &[&str] = &[
    general::LIGATURE_CARETS,
    general::KERNING_FOR_NON_LIGATED_SEQUENCES,
    general::FAMILY_AND_STYLE_MAX_LENGTH,
];

const EXPECTED_CHECK_IDS: &[&str] = &[
    general::SINGLE_FAMILY_DIRECTORY,
    general::EQUAL_FONT_VERSIONS,
    general::UNITS_PER_EM,
    general::NAME_LINE_BREAKS,
    general::FAMILY_AND_STYLE_MAX_LENGTH,
    general::LIGATURE_CARETS,
    general::KERNING_FOR_NON_LIGATED_SEQUENCES,
    general::REGULAR_WGHT_COORD,
    NAME_EMPTY_RECORDS,
    CONSISTENT_UPM,
];

pub fn specification() -> SpecResult<Specification> {
    let base = general::specification()?;
    let imported = IMPORTED_SECTIONS
        .iter()
        .chain(general::CONDITIONS.iter())
        .copied();

    SpecificationBuilder::new(NAME)
        .default_section(DEFAULT_SECTION)
        .import_from(&base, imported)
        .check(
            Check::single(NAME_EMPTY_RECORDS, name_empty_records)
                .with_description("Check name table for empty records.")
                .with_rationale(
                    "Check the name table for empty records, as this can cause problems \
                     in Adobe apps.",
                ),
        )
        .check(
            Check::grouped(CONSISTENT_UPM, consistent_upm)
                .with_description("Fonts have consistent Units Per Em?")
                .with_rationale(
                    "While not required by the OpenType spec, we (Adobe) expect that a \
                     group of fonts designed & produced as a family have consistent units \
                     per em.",
                ),
        )
        .skip_filter(check_skip_filter)
        .expect_checks(ExpectedChecks::exclusive(EXPECTED_CHECK_IDS.iter().copied()))
        .build()
}

fn check_skip_filter(check_id: &str, context: &Context) -> SkipDecision {
    if context.document().is_some() && FAMILY_ONLY.iter().any(|id| *id == check_id) {
        return SkipDecision::skip_silently();
    }
    SkipDecision::proceed()
}

fn name_empty_records(ctx: &Context) -> anyhow::Result<Verdicts> {
    let records = font::name_records(single(ctx)?)?;
    let mut found: Vec<Verdict> = records
        .iter()
        .filter(|r| r.string.trim().is_empty())
        .map(|r| {
            Verdict::fail(format!(
                "'name' table record with key={:?} is empty and should be removed.",
                r.key()
            ))
        })
        .collect();
    if found.is_empty() {
        found.push(Verdict::pass("No empty name table records found."));
    }
    Ok(verdicts(found))
}

fn consistent_upm(ctx: &Context) -> anyhow::Result<Verdicts> {
    let upms = ctx
        .documents()
        .iter()
        .map(|d| font::units_per_em(d))
        .collect::<anyhow::Result<BTreeSet<u64>>>()?;
    if upms.len() > 1 {
        return Ok(verdicts(vec![Verdict::fail(format!(
            "Fonts have different units per em: {:?}.",
            upms.into_iter().collect::<Vec<_>>()
        ))]));
    }
    Ok(verdicts(vec![Verdict::pass("Fonts have consistent units per em.")]))
}
