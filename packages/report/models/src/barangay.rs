//! Barangay vocabulary.
//!
//! The built-in list is embedded at compile time. Deployments may ship an
//! updated JSON array of names, loaded with [`BarangayList::from_json`]; if
//! that fails callers keep the built-in list.

use std::collections::BTreeSet;

/// Baguio City barangays, embedded at compile time.
const BUILTIN_BARANGAYS: &str = include_str!("../data/barangays.json");

/// Number of entries in the embedded list (used in tests).
#[cfg(test)]
const EXPECTED_BARANGAY_COUNT: usize = 128;

/// An ordered list of selectable barangay names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarangayList {
    names: Vec<String>,
}

impl BarangayList {
    /// Returns the embedded list.
    ///
    /// # Panics
    ///
    /// Panics if the embedded JSON is malformed (this is a compile-time
    /// guarantee since the file is embedded).
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_BARANGAYS)
            .unwrap_or_else(|e| panic!("Failed to parse barangays.json: {e}"))
    }

    /// Parses a JSON array of names. Blank entries and duplicates are
    /// dropped; order is otherwise preserved.
    ///
    /// # Errors
    ///
    /// * If `json` is not an array of strings
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<String> = serde_json::from_str(json)?;
        let mut seen = BTreeSet::new();
        let names = raw
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        Ok(Self { names })
    }

    /// Returns `true` if `name` is one of the listed barangays.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|n| n == name)
    }

    /// The names, in display order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BarangayList {
    fn default() -> Self {
        Self::builtin()
    }
}
