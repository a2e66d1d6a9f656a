//! Module normalizer
//!
//! Resolves a raw (code, name) pair taken from a dynamic onto the canonical
//! table. Resolution order:
//! 1. Exact, case-insensitive name match. Names shared by both tracks
//!    (e.g. "Primers auxilis") resolve to the entry with an unresolved cycle
//!    instead of the first table entry (which would always be TIS); the
//!    record's track tags settle them.
//! 2. Keyword rules, then canonical-name containment (names longer than 5 chars)
//! 3. Synthetic entry with an unresolved cycle
//!
//! Step 3 is a degraded result, not an error. Callers may upgrade the cycle
//! from the record's own track tags with [`NormalizedModule::upgrade_cycle`].

use serde::{Deserialize, Serialize};

use super::canonical::{CanonicalModule, Cycle, Track, CANONICAL_MODULES};
use super::rules::{match_keyword, KeywordRule, KEYWORD_RULES};

/// Minimum name length (in chars, exclusive) for partial matching
const PARTIAL_MATCH_MIN_LEN: usize = 5;

/// A module reference resolved (or not) against the canonical table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedModule {
    pub code: String,
    pub name: String,
    pub cycle: Cycle,
    /// `"<code> - <name> [<cycle>]"`, always derived from the fields above
    pub label: String,
}

impl NormalizedModule {
    pub fn new(code: impl Into<String>, name: impl Into<String>, cycle: Cycle) -> Self {
        let code = code.into();
        let name = name.into();
        let label = format_label(&code, &name, cycle);
        Self {
            code,
            name,
            cycle,
            label,
        }
    }

    fn from_canonical(entry: &CanonicalModule) -> Self {
        Self::new(entry.code, entry.name, entry.track.into())
    }

    /// Resolve an unresolved cycle from the record's track tags
    ///
    /// Applies only when exactly one tag is declared and it names a known
    /// track. Zero or several tags are ambiguous and leave the module as is.
    pub fn upgrade_cycle<S: AsRef<str>>(self, targets: &[S]) -> Self {
        if self.cycle.is_resolved() || targets.len() != 1 {
            return self;
        }
        match targets[0].as_ref().parse::<Track>() {
            Ok(track) => Self::new(self.code, self.name, track.into()),
            Err(_) => self,
        }
    }
}

/// Build a module label from its parts
pub fn format_label(code: &str, name: &str, cycle: Cycle) -> String {
    format!("{} - {} [{}]", code, name, cycle)
}

/// Normalizer bound to a keyword rule table
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    rules: &'static [KeywordRule],
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: KEYWORD_RULES,
        }
    }
}

impl Normalizer {
    /// Resolve a raw (code, name) pair
    ///
    /// Returns `None` only when both inputs are empty or blank.
    pub fn normalize(&self, code: Option<&str>, name: Option<&str>) -> Option<NormalizedModule> {
        let raw_code = code.map(str::trim).unwrap_or_default();
        let raw_name = name.map(str::trim).unwrap_or_default();
        if raw_code.is_empty() && raw_name.is_empty() {
            return None;
        }

        let lowered = raw_name.to_lowercase();

        let mut exact = CANONICAL_MODULES
            .iter()
            .filter(|m| m.name.to_lowercase() == lowered);
        if let Some(entry) = exact.next() {
            if exact.any(|other| other.track != entry.track) {
                return Some(NormalizedModule::new(entry.code, entry.name, Cycle::Unresolved));
            }
            return Some(NormalizedModule::from_canonical(entry));
        }

        if lowered.chars().count() > PARTIAL_MATCH_MIN_LEN {
            let partial = match_keyword(self.rules, &lowered).or_else(|| {
                CANONICAL_MODULES
                    .iter()
                    .find(|m| m.name.to_lowercase().contains(&lowered))
            });
            if let Some(entry) = partial {
                return Some(NormalizedModule::from_canonical(entry));
            }
        }

        let code = raw_code.to_uppercase();
        let name = if raw_name.is_empty() {
            code.clone()
        } else {
            raw_name.to_string()
        };
        Some(NormalizedModule::new(code, name, Cycle::Unresolved))
    }
}

/// Resolve a raw (code, name) pair with the default rule table
pub fn normalize_module(code: Option<&str>, name: Option<&str>) -> Option<NormalizedModule> {
    Normalizer::default().normalize(code, name)
}
