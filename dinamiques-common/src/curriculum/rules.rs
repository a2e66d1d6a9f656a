//! Keyword rules for partial module names
//!
//! Free-text module names often carry only a distinctive word ("Destreses",
//! "sanitaria"). Each rule maps such a word onto one canonical entry. Rules
//! are evaluated in order against the lower-cased input; the first rule with
//! any matching pattern wins.

use super::canonical::{self, CanonicalModule, Track};

/// A keyword rule: any pattern contained in the name selects the target
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    /// Lower-case substrings, accented and unaccented spellings listed apart
    pub patterns: &'static [&'static str],
    pub code: &'static str,
    pub track: Track,
}

impl KeywordRule {
    pub fn matches(&self, lowered_name: &str) -> bool {
        self.patterns.iter().any(|p| lowered_name.contains(p))
    }

    /// Canonical entry this rule points to
    pub fn target(&self) -> Option<&'static CanonicalModule> {
        canonical::find(self.code, self.track)
    }
}

/// Ordered rule table
pub static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule { patterns: &["destreses"], code: "MP09", track: Track::Tapd },
    KeywordRule { patterns: &["habilitats"], code: "MP09", track: Track::Tis },
    KeywordRule { patterns: &["sanitària", "sanitaria"], code: "MP02", track: Track::Tapd },
    KeywordRule { patterns: &["higiènica", "higienica"], code: "MP03", track: Track::Tapd },
    KeywordRule { patterns: &["metodologia"], code: "MP02", track: Track::Tis },
    KeywordRule { patterns: &["context"], code: "MP01", track: Track::Tis },
    KeywordRule { patterns: &["organització", "organizació"], code: "MP01", track: Track::Tapd },
];

/// First rule matching the lower-cased name, resolved to its canonical entry
pub fn match_keyword(rules: &[KeywordRule], lowered_name: &str) -> Option<&'static CanonicalModule> {
    rules
        .iter()
        .find(|rule| rule.matches(lowered_name))
        .and_then(KeywordRule::target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_targets_a_canonical_entry() {
        for rule in KEYWORD_RULES {
            assert!(rule.target().is_some(), "dangling rule {} {}", rule.code, rule.track);
        }
    }

    #[test]
    fn test_rule_order_is_priority() {
        // "context" would also match, but "metodologia" comes first
        let m = match_keyword(KEYWORD_RULES, "metodologia i context").unwrap();
        assert_eq!((m.code, m.track), ("MP02", Track::Tis));
    }

    #[test]
    fn test_unaccented_spelling() {
        let m = match_keyword(KEYWORD_RULES, "atencio sanitaria basica").unwrap();
        assert_eq!((m.code, m.track), ("MP02", Track::Tapd));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [KeywordRule { patterns: &["teleassist"], code: "MP06", track: Track::Tapd }];
        let m = match_keyword(&rules, "teleassistencia domiciliaria").unwrap();
        assert_eq!(m.name, "Teleassistència");
        assert!(match_keyword(&rules, "habilitats").is_none());
    }
}
