//! Curriculum reference data and module normalization

pub mod canonical;
pub mod normalize;
pub mod rules;

pub use canonical::{CanonicalModule, Cycle, Track, CANONICAL_MODULES};
pub use normalize::{format_label, normalize_module, NormalizedModule, Normalizer};
pub use rules::{KeywordRule, KEYWORD_RULES};
