//! Set of metric keys suppressed for this process, parsed once at startup
//! from `ALTIBASE_DISABLED_METRICS` (comma-separated). Comparison is
//! case-sensitive on the key, i.e. the part after the `altibase_` prefix.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisableSet {
    keys: BTreeSet<String>,
}

impl DisableSet {
    /// Split on commas, trim whitespace, drop empty tokens.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let keys = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { keys }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        !self.keys.is_empty() && self.keys.contains(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Canonical comma-separated form; `parse` of this yields an equal set.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.keys.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

impl std::fmt::Display for DisableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.keys.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.serialize())
        }
    }
}
