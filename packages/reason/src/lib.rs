#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical labels for free-text drone dispatch reasons.
//!
//! The department's tagging vocabulary drifted over the years (typos,
//! synonyms, plural forms), so the same kind of call shows up under many
//! spellings. [`canonicalize`] folds the known variants onto one display
//! label so facet counts do not fragment. Unknown reasons pass through
//! trimmed and act as their own canonical label.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known raw variants and the canonical label each one maps to.
///
/// Keys are matched after [`lookup_key`] normalization, so casing and
/// whitespace in this table do not matter.
pub const REASON_VARIANTS: &[(&str, &str)] = &[
    // ── Weapons ─────────────────────────────────────────────────────
    ("person with a gun", "Person with weapon"),
    ("person with gun", "Person with weapon"),
    ("person w/ gun", "Person with weapon"),
    ("man with a gun", "Person with weapon"),
    ("subject with a gun", "Person with weapon"),
    ("person with a knife", "Person with weapon"),
    ("person with knife", "Person with weapon"),
    ("person with a weapon", "Person with weapon"),
    ("person with weapon", "Person with weapon"),
    ("brandishing", "Person with weapon"),
    ("brandishing a weapon", "Person with weapon"),
    ("shots fired", "Shots fired"),
    ("shot fired", "Shots fired"),
    ("shots heard", "Shots fired"),
    ("shooting", "Shooting"),
    ("shooting investigation", "Shooting"),
    ("stabbing", "Stabbing"),
    // ── Warrants ────────────────────────────────────────────────────
    ("warrant", "Warrant service"),
    ("warrant service", "Warrant service"),
    ("warrant arrest", "Warrant service"),
    ("warrants", "Warrant service"),
    ("felony warrant", "Warrant service"),
    ("search warrant", "Search warrant"),
    ("search warrant service", "Search warrant"),
    ("parole search", "Probation/parole search"),
    ("probation search", "Probation/parole search"),
    ("4th waiver search", "Probation/parole search"),
    // ── Missing / at-risk people ────────────────────────────────────
    ("missing person", "Missing person"),
    ("missing persons", "Missing person"),
    ("missing juvenile", "Missing person"),
    ("missing child", "Missing person"),
    ("missing at risk", "Missing person"),
    ("at risk missing", "Missing person"),
    ("at-risk missing person", "Missing person"),
    ("lost child", "Missing person"),
    ("suicidal subject", "Suicidal person"),
    ("suicidal person", "Suicidal person"),
    ("suicide attempt", "Suicidal person"),
    ("welfare check", "Welfare check"),
    ("check the welfare", "Welfare check"),
    ("check welfare", "Welfare check"),
    // ── Violence ────────────────────────────────────────────────────
    ("assault", "Assault"),
    ("assault with a deadly weapon", "Assault with deadly weapon"),
    ("assault with deadly weapon", "Assault with deadly weapon"),
    ("adw", "Assault with deadly weapon"),
    ("domestic violence", "Domestic violence"),
    ("domestic", "Domestic violence"),
    ("dv", "Domestic violence"),
    ("domestic disturbance", "Domestic violence"),
    ("fight", "Fight"),
    ("fight in progress", "Fight"),
    ("robbery", "Robbery"),
    ("armed robbery", "Robbery"),
    ("robbery in progress", "Robbery"),
    // ── Property ────────────────────────────────────────────────────
    ("burglary", "Burglary"),
    ("burglary in progress", "Burglary"),
    ("residential burglary", "Burglary"),
    ("commercial burglary", "Burglary"),
    ("theft", "Theft"),
    ("petty theft", "Theft"),
    ("grand theft", "Theft"),
    ("shoplifting", "Theft"),
    ("stolen vehicle", "Stolen vehicle"),
    ("stolen vehicles", "Stolen vehicle"),
    ("vehicle theft", "Stolen vehicle"),
    ("auto theft", "Stolen vehicle"),
    ("vandalism", "Vandalism"),
    ("vandalism in progress", "Vandalism"),
    // ── Suspicious activity ─────────────────────────────────────────
    ("suspicious person", "Suspicious person"),
    ("suspicious persons", "Suspicious person"),
    ("suspicious subject", "Suspicious person"),
    ("suspicious vehicle", "Suspicious vehicle"),
    ("suspicious vehicles", "Suspicious vehicle"),
    ("suspicious circumstances", "Suspicious circumstances"),
    ("prowler", "Prowler"),
    ("trespassing", "Trespassing"),
    ("trespass", "Trespassing"),
    // ── Traffic / pursuit ───────────────────────────────────────────
    ("pursuit", "Vehicle pursuit"),
    ("vehicle pursuit", "Vehicle pursuit"),
    ("foot pursuit", "Foot pursuit"),
    ("traffic collision", "Traffic collision"),
    ("traffic accident", "Traffic collision"),
    ("hit and run", "Hit and run"),
    ("hit & run", "Hit and run"),
    ("reckless driver", "Reckless driving"),
    ("reckless driving", "Reckless driving"),
    // ── Fire / hazards ──────────────────────────────────────────────
    ("fire", "Fire"),
    ("structure fire", "Fire"),
    ("brush fire", "Fire"),
    ("vegetation fire", "Fire"),
    ("hazmat", "Hazardous materials"),
    ("hazardous materials", "Hazardous materials"),
];

/// Lookup table built once from [`REASON_VARIANTS`], keyed by normalized
/// variant. Only listed variants are keys; a canonical label that no
/// variant spells passes through like any other unmapped reason.
static REASON_TABLE: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let table: HashMap<String, &'static str> = REASON_VARIANTS
        .iter()
        .map(|(variant, canonical)| (lookup_key(variant), *canonical))
        .collect();
    log::debug!("Built reason table with {} keys", table.len());
    table
});

/// Normalizes a raw reason for table lookup: trims, lowercases and
/// collapses internal whitespace runs to a single space.
#[must_use]
pub fn lookup_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a raw reason string onto its canonical display label.
///
/// Returns the trimmed input unchanged when the reason is not a known
/// variant. Empty input yields an empty string.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    REASON_TABLE
        .get(&lookup_key(trimmed))
        .map_or_else(|| trimmed.to_string(), |canonical| (*canonical).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_table_entry() {
        for (variant, canonical) in REASON_VARIANTS {
            assert_eq!(
                canonicalize(variant),
                *canonical,
                "{variant:?} should map to {canonical:?}"
            );
        }
    }

    #[test]
    fn merges_gun_variants() {
        assert_eq!(canonicalize("Person with a gun"), "Person with weapon");
        assert_eq!(canonicalize("person with gun"), "Person with weapon");
        assert_eq!(canonicalize("  PERSON   WITH  GUN "), "Person with weapon");
    }

    #[test]
    fn unknown_reason_passes_through_trimmed() {
        assert_eq!(canonicalize("  Drone demo flight "), "Drone demo flight");
        assert_eq!(canonicalize("Fire"), "Fire");
    }

    #[test]
    fn unlisted_canonical_label_is_not_rewritten() {
        assert_eq!(canonicalize(" PROBATION/PAROLE SEARCH "), "PROBATION/PAROLE SEARCH");
        assert_eq!(canonicalize("probation search"), "Probation/parole search");
    }

    #[test]
    fn empty_input_yields_empty_label() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
    }

    #[test]
    fn canonical_labels_are_fixed_points() {
        for (_, canonical) in REASON_VARIANTS {
            assert_eq!(canonicalize(canonical), *canonical);
        }
    }

    #[test]
    fn no_variant_maps_to_conflicting_labels() {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (variant, canonical) in REASON_VARIANTS {
            if let Some(previous) = seen.insert(lookup_key(variant), canonical) {
                assert_eq!(previous, *canonical, "duplicate key {variant:?}");
            }
        }
    }
}
