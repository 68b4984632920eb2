//! Free-text helpers for the submission form.

use serde::{Deserialize, Serialize};

/// Separator between labelled description parts.
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// Maximum accepted reporter name length, in characters.
pub const REPORTER_MAX_NAME_LEN: usize = 64;

/// The structured sub-fields a description is composed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionParts {
    /// What the waste is made of.
    #[serde(default, rename = "materialDesc", skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,
    /// Where exactly the waste is.
    #[serde(default, rename = "spotDesc", skip_serializing_if = "Option::is_none")]
    pub spot: Option<String>,
    /// Land classification (road side, river bank, ...).
    #[serde(default, rename = "landType", skip_serializing_if = "Option::is_none")]
    pub land_type: Option<String>,
    /// Nearby landmark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

impl DescriptionParts {
    /// Joins the non-empty parts as `Label: value` pairs.
    #[must_use]
    pub fn compose(&self) -> String {
        [
            ("Materials", &self.materials),
            ("Specific Spot", &self.spot),
            ("Land", &self.land_type),
            ("Landmark", &self.landmark),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect::<Vec<_>>()
        .join(DESCRIPTION_SEPARATOR)
    }

    /// Returns `true` if every part is missing or blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compose().is_empty()
    }
}

/// Cleans a reporter's display name.
///
/// Collapses whitespace, rejects digits and any character other than
/// letters, combining marks, spaces, `.`, `'`, `-` and en/em dashes, and
/// truncates to [`REPORTER_MAX_NAME_LEN`] characters. Returns `None` when
/// the name is empty or rejected.
#[must_use]
pub fn sanitize_reporter_name(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let allowed = |c: char| {
        c.is_alphabetic() || is_combining_mark(c) || matches!(c, ' ' | '.' | '\'' | '-' | '–' | '—')
    };
    if collapsed.chars().any(|c| c.is_numeric() || !allowed(c)) {
        return None;
    }

    Some(collapsed.chars().take(REPORTER_MAX_NAME_LEN).collect())
}

/// Combining diacritical mark blocks.
const fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}' | '\u{FE20}'..='\u{FE2F}')
}
