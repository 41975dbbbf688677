//! Builtin specifications.

use anyhow::Result;

pub mod adobe_fonts;
pub mod font;
pub mod general;

use crate::specification::Specification;

/// Builtin specification names with a one-line summary, in listing order.
pub const BUILTIN: &[(&str, &str)] = &[
    (general::NAME, "Vendor-neutral font checks"),
    (adobe_fonts::NAME, "Checks for Adobe Fonts (formerly known as Typekit)"),
];

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

/// Build a builtin specification by name.
pub fn by_name(name: &str) -> Result<Specification> {
    let spec = match name {
        general::NAME => general::specification()?,
        adobe_fonts::NAME => adobe_fonts::specification()?,
        other => anyhow::bail!(
            "Unknown specification '{}' (available: {})",
            other,
            names().collect::<Vec<_>>().join(", ")
        ),
    };
    Ok(spec)
}
