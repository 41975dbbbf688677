//! The `general` base specification: vendor-neutral font checks.
//!
//! Other specifications import from it by section, check id or condition
//! name.

use std::collections::{BTreeSet, HashSet};

use crate::check::Check;
use crate::condition::Condition;
use crate::document::Context;
use crate::errors::SpecResult;
use crate::event::{verdicts, Verdict, Verdicts};
use crate::specification::{Specification, SpecificationBuilder};

use super::font::{self, single};

pub const NAME: &str = "general";

pub const UNITS_PER_EM: &str = "com.google.fonts/check/unitsperem";
pub const SINGLE_FAMILY_DIRECTORY: &str = "com.google.fonts/check/single_family_directory";
pub const EQUAL_FONT_VERSIONS: &str = "com.google.fonts/check/equal_font_versions";
pub const NAME_LINE_BREAKS: &str = "com.google.fonts/check/name/line_breaks";
pub const FAMILY_AND_STYLE_MAX_LENGTH: &str =
    "com.google.fonts/check/name/family_and_style_max_length";
pub const LIGATURE_CARETS: &str = "com.google.fonts/check/ligature_carets";
pub const KERNING_FOR_NON_LIGATED_SEQUENCES: &str =
    "com.google.fonts/check/kerning_for_non_ligated_sequences";
pub const REGULAR_WGHT_COORD: &str = "com.google.fonts/check/varfont/regular_wght_coord";

/// Condition names shared with importing specifications.
pub const CONDITIONS: &[&str] = &[
    "has_name_table",
    "is_variable_font",
    "has_wght_axis",
    "has_ligatures",
];

/// Longest family + style name accepted by some desktop applications.
const MAX_FAMILY_AND_STYLE_LENGTH: usize = 27;

pub fn specification() -> SpecResult<Specification> {
    SpecificationBuilder::new(NAME)
        .default_section("general")
        .condition(
            Condition::new("has_name_table", |ctx| {
                Ok(font::has_name_table(single(ctx)?))
            })
            .with_description("Font carries a name table"),
        )
        .condition(
            Condition::new("is_variable_font", |ctx| {
                Ok(!font::axes(single(ctx)?)?.is_empty())
            })
            .with_description("Font declares at least one variation axis"),
        )
        .condition(Condition::new("has_wght_axis", |ctx| {
            Ok(font::axes(single(ctx)?)?.iter().any(|a| a.tag == "wght"))
        }))
        .condition(Condition::new("has_ligatures", |ctx| {
            Ok(!font::ligatures(single(ctx)?, "ligatures")?.is_empty())
        }))
        .check(
            Check::grouped(SINGLE_FAMILY_DIRECTORY, single_family_directory)
                .with_description("Checking all files are in the same directory.")
                .with_rationale(
                    "If the set of font files passed in contains files from more than \
                     one directory, they most likely belong to different families.",
                ),
        )
        .check(
            Check::grouped(EQUAL_FONT_VERSIONS, equal_font_versions)
                .with_description("Make sure all font files have the same version value."),
        )
        .check_in(
            "head",
            Check::single(UNITS_PER_EM, units_per_em)
                .with_description("Checking unitsPerEm value is reasonable.")
                .with_rationale(
                    "Values outside 16..16384 are invalid; powers of two, 1000 and 2000 \
                     are the customary choices.",
                ),
        )
        .check_in(
            "name",
            Check::single(NAME_LINE_BREAKS, name_line_breaks)
                .requires("has_name_table")
                .with_description("Name table entries should not contain line-breaks."),
        )
        .check_in(
            "name",
            Check::single(FAMILY_AND_STYLE_MAX_LENGTH, family_and_style_max_length)
                .with_description("Combined length of family and style must not exceed 27 characters."),
        )
        .check_in(
            "gdef",
            Check::single(LIGATURE_CARETS, ligature_carets)
                .requires("has_ligatures")
                .with_description("Are there caret positions declared for every ligature?"),
        )
        .check_in(
            "gpos",
            Check::single(KERNING_FOR_NON_LIGATED_SEQUENCES, kerning_for_non_ligated_sequences)
                .requires("has_ligatures")
                .with_description("Is there kerning info for non-ligated sequences?"),
        )
        .check_in(
            "fvar",
            Check::single(REGULAR_WGHT_COORD, regular_wght_coord)
                .requires("is_variable_font")
                .requires("has_wght_axis")
                .with_description("The variable font 'wght' axis coordinate must be 400 on the 'Regular' instance."),
        )
        .build()
}

fn single_family_directory(ctx: &Context) -> anyhow::Result<Verdicts> {
    let directories: BTreeSet<String> = ctx.documents().iter().map(|d| font::directory(d)).collect();
    if directories.len() > 1 {
        let listed: Vec<&str> = directories.iter().map(String::as_str).collect();
        return Ok(verdicts(vec![Verdict::fail(format!(
            "Not all fonts passed in the command line are in the same directory: {}",
            listed.join(", ")
        ))]));
    }
    Ok(verdicts(vec![Verdict::pass("All files are in the same directory.")]))
}

fn equal_font_versions(ctx: &Context) -> anyhow::Result<Verdicts> {
    let versions: BTreeSet<&str> = ctx
        .documents()
        .iter()
        .map(|d| d.get_str("font_version").unwrap_or("unknown"))
        .collect();
    if versions.len() > 1 {
        let listed: Vec<&str> = versions.into_iter().collect();
        return Ok(verdicts(vec![Verdict::warn(format!(
            "Version info differs among font files of the same font project: {}",
            listed.join(", ")
        ))]));
    }
    Ok(verdicts(vec![Verdict::pass("All font files have the same version.")]))
}

fn units_per_em(ctx: &Context) -> anyhow::Result<Verdicts> {
    let upem = font::units_per_em(single(ctx)?)?;
    let verdict = if !(16..=16384).contains(&upem) {
        Verdict::fail(format!(
            "unitsPerEm value of {} is outside the valid range 16..16384.",
            upem
        ))
    } else if upem.is_power_of_two() || upem == 1000 || upem == 2000 {
        Verdict::pass(format!("unitsPerEm value of {} is reasonable.", upem))
    } else {
        Verdict::warn(format!(
            "unitsPerEm value of {} is valid but not a customary choice.",
            upem
        ))
    };
    Ok(verdicts(vec![verdict]))
}

fn name_line_breaks(ctx: &Context) -> anyhow::Result<Verdicts> {
    let records = font::name_records(single(ctx)?)?;
    let mut found: Vec<Verdict> = records
        .iter()
        .filter(|r| r.string.contains('\n'))
        .map(|r| {
            Verdict::fail(format!(
                "Name entry {:?} contains a line-break.",
                r.key()
            ))
        })
        .collect();
    if found.is_empty() {
        found.push(Verdict::pass("Name table entries are all single-line."));
    }
    Ok(verdicts(found))
}

fn family_and_style_max_length(ctx: &Context) -> anyhow::Result<Verdicts> {
    let doc = single(ctx)?;
    let family = doc.get_str("family_name").unwrap_or_default();
    let style = doc.get_str("style_name").unwrap_or_default();
    let length = family.chars().count() + style.chars().count();
    let verdict = if length > MAX_FAMILY_AND_STYLE_LENGTH {
        Verdict::warn(format!(
            "The combined length of family and style exceeds {} chars: '{} {}'",
            MAX_FAMILY_AND_STYLE_LENGTH, family, style
        ))
    } else {
        Verdict::pass("All name entries are good.")
    };
    Ok(verdicts(vec![verdict]))
}

fn ligature_carets(ctx: &Context) -> anyhow::Result<Verdicts> {
    let doc = single(ctx)?;
    let declared: HashSet<Vec<String>> = font::ligatures(doc, "ligature_carets")?.into_iter().collect();
    let missing: Vec<String> = font::ligatures(doc, "ligatures")?
        .into_iter()
        .filter(|lig| !declared.contains(lig))
        .map(|lig| lig.join("_"))
        .collect();
    if missing.is_empty() {
        return Ok(verdicts(vec![Verdict::pass(
            "Looks good: every ligature has caret positions.",
        )]));
    }
    Ok(verdicts(vec![Verdict::warn(format!(
        "This font lacks caret positions for ligature glyphs: {}",
        missing.join(", ")
    ))]))
}

fn kerning_for_non_ligated_sequences(ctx: &Context) -> anyhow::Result<Verdicts> {
    let doc = single(ctx)?;
    let kerned: HashSet<Vec<String>> = font::ligatures(doc, "kerning_pairs")?.into_iter().collect();
    let mut missing: Vec<String> = Vec::new();
    for ligature in font::ligatures(doc, "ligatures")? {
        for pair in ligature.windows(2) {
            let label = format!("{} {}", pair[0], pair[1]);
            if !kerned.contains(&pair.to_vec()) && !missing.contains(&label) {
                missing.push(label);
            }
        }
    }
    if missing.is_empty() {
        return Ok(verdicts(vec![Verdict::pass(
            "GPOS table provides kerning info for all non-ligated sequences.",
        )]));
    }
    Ok(verdicts(vec![Verdict::warn(format!(
        "GPOS table lacks kerning info for the following non-ligated sequences: {}",
        missing.join(", ")
    ))]))
}

fn regular_wght_coord(ctx: &Context) -> anyhow::Result<Verdicts> {
    let instances = font::named_instances(single(ctx)?)?;
    let Some(regular) = instances.iter().find(|i| i.name == "Regular") else {
        return Ok(verdicts(vec![Verdict::warn(
            "Font has no 'Regular' named instance.",
        )]));
    };
    let verdict = match regular.coordinates.get("wght") {
        Some(coord) if (*coord - 400.0).abs() < f64::EPSILON => {
            Verdict::pass("Regular:wght is 400.")
        }
        Some(coord) => Verdict::fail(format!(
            "The 'wght' axis coordinate of the 'Regular' instance must be 400. Got {} instead.",
            coord
        )),
        None => Verdict::fail("The 'Regular' instance has no 'wght' coordinate."),
    };
    Ok(verdicts(vec![verdict]))
}
