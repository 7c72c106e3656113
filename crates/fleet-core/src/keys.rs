//! Canonicalisation of free-text truck identifiers.
//!
//! The three exports are maintained independently and disagree on prefixes,
//! casing and separators (`"SPOT-1207"`, `" spot-1207 "`, `"1207"`,
//! `"TRK--12"`). Every table goes through [`normalize_unit_id`] before the
//! merge so that those spellings land on the same [`UnitKey`].

use crate::models::UnitKey;

/// Prefix added by one of the exports to spot-market units.
pub const SPOT_PREFIX: &str = "SPOT-";

/// Normalise a raw identifier into a join key.
///
/// Steps: trim, upper-case, drop a leading `SPOT-`, turn hyphens into
/// spaces, collapse runs of whitespace into a single space.
///
/// A missing identifier, or one that is blank after these steps, yields
/// [`UnitKey::Unset`]. The function is idempotent.
///
/// # Examples
///
/// ```
/// use fleet_core::keys::normalize_unit_id;
/// use fleet_core::models::UnitKey;
///
/// assert_eq!(normalize_unit_id(Some(" spot-123 ")), normalize_unit_id(Some("SPOT-123")));
/// assert_eq!(normalize_unit_id(Some("trk-12  a")), UnitKey::Known("TRK 12 A".to_string()));
/// assert!(normalize_unit_id(None).is_unset());
/// ```
pub fn normalize_unit_id(raw: Option<&str>) -> UnitKey {
    let Some(raw) = raw else {
        return UnitKey::Unset;
    };

    let upper = raw.trim().to_uppercase();
    let without_prefix = upper.strip_prefix(SPOT_PREFIX).unwrap_or(&upper);
    let dehyphenated = without_prefix.replace('-', " ");
    let collapsed = dehyphenated.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        UnitKey::Unset
    } else {
        UnitKey::Known(collapsed)
    }
}

/// Convenience wrapper for owned optional identifiers.
pub fn normalize_owned(raw: &Option<String>) -> UnitKey {
    normalize_unit_id(raw.as_deref())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
