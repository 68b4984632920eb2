//! Report identifiers: `R-<5-digit sequence><MMDDYYYY>`.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Largest sequence number representable in the five-digit slot.
pub const MAX_SEQUENCE: u32 = 99_999;

static REPORT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^R-([0-9]{5})([0-9]{8})$").unwrap_or_else(|e| panic!("invalid id regex: {e}"))
});

/// Formats an id from a sequence number and the submission date.
///
/// Sequences past [`MAX_SEQUENCE`] wrap around, skipping zero.
#[must_use]
pub fn format_report_id(sequence: u32, date: NaiveDate) -> String {
    let sequence = match sequence % (MAX_SEQUENCE + 1) {
        0 => 1,
        n => n,
    };
    format!(
        "R-{sequence:05}{:02}{:02}{:04}",
        date.month(),
        date.day(),
        date.year()
    )
}

/// Returns `true` if `id` matches the `R-<13 digits>` format.
#[must_use]
pub fn is_valid_report_id(id: &str) -> bool {
    REPORT_ID_RE.is_match(id)
}

/// Extracts the sequence number from a well-formed id.
#[must_use]
pub fn parse_sequence(id: &str) -> Option<u32> {
    REPORT_ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
