//! Status vocabulary.
//!
//! Producers write free-form status strings (`"in_progress"`, `"Done"`,
//! `"verified"`, ...). Display code only ever deals with the three
//! [`CanonicalStatus`] values, derived through a single lookup table.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Display status of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CanonicalStatus {
    /// Awaiting action (includes `verified` and anything unrecognized).
    Pending,
    /// A crew has been assigned or work is underway.
    Ongoing,
    /// The dumpsite has been cleaned up.
    Cleaned,
}

impl CanonicalStatus {
    /// Returns all variants in dashboard order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::Ongoing, Self::Cleaned]
    }
}

/// Normalized raw status key -> canonical status.
const STATUS_TABLE: &[(&str, CanonicalStatus)] = &[
    ("cleaned", CanonicalStatus::Cleaned),
    ("clean", CanonicalStatus::Cleaned),
    ("cleaned-up", CanonicalStatus::Cleaned),
    ("done", CanonicalStatus::Cleaned),
    ("resolved", CanonicalStatus::Cleaned),
    ("fixed", CanonicalStatus::Cleaned),
    ("ongoing", CanonicalStatus::Ongoing),
    ("in-progress", CanonicalStatus::Ongoing),
    ("inprogress", CanonicalStatus::Ongoing),
    ("assigned", CanonicalStatus::Ongoing),
    ("working", CanonicalStatus::Ongoing),
    ("active", CanonicalStatus::Ongoing),
];

/// Reduces a raw status to its lookup key.
///
/// Lowercases, turns runs of whitespace, `_` and `-` into a single `-`,
/// drops any other punctuation, and trims separators from both ends.
#[must_use]
pub fn status_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('-');
            }
            pending_separator = false;
            key.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_separator = true;
        }
    }

    key
}

/// Maps any raw status string to its [`CanonicalStatus`].
///
/// Total and idempotent: unknown values (and `verified`) map to
/// [`CanonicalStatus::Pending`].
#[must_use]
pub fn canonical_status(raw: &str) -> CanonicalStatus {
    let key = status_key(raw);
    STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(CanonicalStatus::Pending, |(_, status)| *status)
}

/// Administrator actions that change a report's status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusAction {
    /// Assign a cleanup crew.
    Assign,
    /// Confirm the report is genuine.
    Verify,
    /// Mark the site as cleaned.
    Clean,
}

impl StatusAction {
    /// Raw status string written to the report for this action.
    #[must_use]
    pub const fn raw_status(self) -> &'static str {
        match self {
            Self::Assign => "in_progress",
            Self::Verify => "verified",
            Self::Clean => "cleaned",
        }
    }

    /// Canonical status the report displays after this action.
    #[must_use]
    pub fn resulting_status(self) -> CanonicalStatus {
        canonical_status(self.raw_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_map_to_expected_status() {
        assert_eq!(canonical_status("Cleaned"), CanonicalStatus::Cleaned);
        assert_eq!(canonical_status(" cleaned_up "), CanonicalStatus::Cleaned);
        assert_eq!(canonical_status("RESOLVED"), CanonicalStatus::Cleaned);
        assert_eq!(canonical_status("in_progress"), CanonicalStatus::Ongoing);
        assert_eq!(canonical_status("In Progress"), CanonicalStatus::Ongoing);
        assert_eq!(canonical_status("assigned"), CanonicalStatus::Ongoing);
    }

    #[test]
    fn unknown_and_verified_are_pending() {
        assert_eq!(canonical_status("verified"), CanonicalStatus::Pending);
        assert_eq!(canonical_status(""), CanonicalStatus::Pending);
        assert_eq!(canonical_status("???"), CanonicalStatus::Pending);
        assert_eq!(canonical_status("rejected"), CanonicalStatus::Pending);
    }

    #[test]
    fn punctuation_is_ignored() {
        assert_eq!(canonical_status("done!"), CanonicalStatus::Cleaned);
        assert_eq!(canonical_status("--working--"), CanonicalStatus::Ongoing);
        assert_eq!(status_key("  In   Progress "), "in-progress");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let samples = [
            "cleaned",
            "In_Progress",
            "verified",
            "pending",
            "Fixed",
            "whatever",
            "",
            "  active  ",
        ];
        for raw in samples {
            let once = canonical_status(raw);
            let twice = canonical_status(once.as_ref());
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn actions_produce_expected_statuses() {
        assert_eq!(
            StatusAction::Assign.resulting_status(),
            CanonicalStatus::Ongoing
        );
        assert_eq!(
            StatusAction::Verify.resulting_status(),
            CanonicalStatus::Pending
        );
        assert_eq!(
            StatusAction::Clean.resulting_status(),
            CanonicalStatus::Cleaned
        );
        assert_eq!("ASSIGN".parse::<StatusAction>().ok(), Some(StatusAction::Assign));
    }
}
