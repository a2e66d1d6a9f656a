//! Filter state and the record predicate engine
//!
//! [`FilterState`] holds one value per filter dimension, each with a
//! "no restriction" sentinel. [`Predicate`] evaluates every active dimension
//! as an independent AND-clause; the first failing clause excludes the
//! record. No clause errors: a field the record does not declare degrades to
//! a neutral default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::connection::{canonical_value, curricular_paths, ModulePath};
use crate::curriculum::{Normalizer, Track};
use crate::favorites::Favorites;
use crate::record::Dynamic;

/// Upper end of the duration slider; at this value duration is unrestricted
pub const MAX_MINUTES: u32 = 120;
/// Upper end of the noise slider
pub const MAX_NOISE: u32 = 5;
/// Upper end of the vulnerability slider; at this value it is unrestricted
pub const MAX_VULNERABILITY: u8 = 5;
/// Group size meaning "any"
pub const ANY_GROUP_SIZE: u32 = 1;
/// Open-ended bounds for dynamics that omit their participant range
pub const DEFAULT_PARTICIPANTS_MIN: u32 = 0;
pub const DEFAULT_PARTICIPANTS_MAX: u32 = 999;

/// Scale a dataset's quality scores are expressed on
///
/// Declared per dataset, never inferred from score magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QualityScale {
    FivePoint,
    #[default]
    TenPoint,
}

impl QualityScale {
    pub fn max(&self) -> f64 {
        match self {
            QualityScale::FivePoint => 5.0,
            QualityScale::TenPoint => 10.0,
        }
    }

    /// Express a raw score on the five-point scale used by the quality floor
    pub fn to_five_point(&self, raw: f64) -> f64 {
        raw * 5.0 / self.max()
    }
}

impl TryFrom<u8> for QualityScale {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(QualityScale::FivePoint),
            10 => Ok(QualityScale::TenPoint),
            other => Err(format!("quality scale must be 5 or 10, got {}", other)),
        }
    }
}

impl From<QualityScale> for u8 {
    fn from(scale: QualityScale) -> Self {
        match scale {
            QualityScale::FivePoint => 5,
            QualityScale::TenPoint => 10,
        }
    }
}

impl FromStr for QualityScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("quality scale must be 5 or 10, got '{}'", s))?;
        QualityScale::try_from(value)
    }
}

/// Digital-material clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DigitalFilter {
    #[default]
    #[serde(rename = "all")]
    Any,
    #[serde(rename = "si")]
    Digital,
    #[serde(rename = "no")]
    NonDigital,
}

/// Serde adapter mapping the `"all"` sentinel (or blank) to `None`
pub mod all_sentinel {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub const ALL: &str = "all";

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Display,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(ALL),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case(ALL) => Ok(None),
            Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
        }
    }
}

/// Current value of every filter dimension
///
/// Serialized with the catalog's wire names; `None` selections travel as
/// `"all"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    #[serde(rename = "cicle", with = "all_sentinel")]
    pub track: Option<Track>,
    #[serde(with = "all_sentinel")]
    pub model: Option<String>,
    #[serde(rename = "categoria", with = "all_sentinel")]
    pub category: Option<String>,
    #[serde(rename = "tipus", with = "all_sentinel")]
    pub activity_type: Option<String>,
    /// Duration ceiling in minutes
    #[serde(rename = "temps")]
    pub max_minutes: u32,
    #[serde(rename = "soroll")]
    pub max_noise: u32,
    /// Requested group size
    pub participants: u32,
    pub tag: String,
    pub search: String,
    #[serde(rename = "favoritesOnly")]
    pub favorites_only: bool,
    #[serde(rename = "mp", with = "all_sentinel")]
    pub module: Option<String>,
    #[serde(rename = "ra", with = "all_sentinel")]
    pub outcome: Option<String>,
    #[serde(rename = "ca", with = "all_sentinel")]
    pub criterion: Option<String>,
    pub digital: DigitalFilter,
    pub material: String,
    #[serde(rename = "vulnerabilitat")]
    pub max_vulnerability: u8,
    #[serde(rename = "experiencia", with = "all_sentinel")]
    pub experience: Option<String>,
    #[serde(rename = "complexitat", with = "all_sentinel")]
    pub complexity: Option<String>,
    /// Quality floor on the five-point scale
    #[serde(rename = "qualitat")]
    pub min_quality: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            track: None,
            model: None,
            category: None,
            activity_type: None,
            max_minutes: MAX_MINUTES,
            max_noise: MAX_NOISE,
            participants: ANY_GROUP_SIZE,
            tag: String::new(),
            search: String::new(),
            favorites_only: false,
            module: None,
            outcome: None,
            criterion: None,
            digital: DigitalFilter::Any,
            material: String::new(),
            max_vulnerability: MAX_VULNERABILITY,
            experience: None,
            complexity: None,
            min_quality: 0.0,
        }
    }
}

impl FilterState {
    /// Number of dimensions holding a non-default value
    pub fn active_count(&self) -> usize {
        [
            self.track.is_some(),
            self.model.is_some(),
            self.category.is_some(),
            self.activity_type.is_some(),
            self.max_minutes < MAX_MINUTES,
            self.max_noise < MAX_NOISE,
            self.participants > ANY_GROUP_SIZE,
            !self.tag.trim().is_empty(),
            !self.search.trim().is_empty(),
            self.favorites_only,
            self.module.is_some(),
            self.outcome.is_some(),
            self.criterion.is_some(),
            self.digital != DigitalFilter::Any,
            !self.material.trim().is_empty(),
            self.max_vulnerability < MAX_VULNERABILITY,
            self.experience.is_some(),
            self.complexity.is_some(),
            self.min_quality > 0.0,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    fn has_curricular_selection(&self) -> bool {
        self.module.is_some() || self.outcome.is_some() || self.criterion.is_some()
    }
}

/// Everything besides the filter values a predicate needs
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub favorites: &'a Favorites,
    pub quality_scale: QualityScale,
    pub normalizer: Normalizer,
}

impl<'a> FilterContext<'a> {
    pub fn new(favorites: &'a Favorites, quality_scale: QualityScale) -> Self {
        Self {
            favorites,
            quality_scale,
            normalizer: Normalizer::default(),
        }
    }
}

/// Filter state prepared for evaluation over many records
///
/// Query strings are lower-cased and curricular selections canonicalized
/// once, not per record.
pub struct Predicate<'a> {
    filters: &'a FilterState,
    ctx: FilterContext<'a>,
    tag: Option<String>,
    search: Option<String>,
    material: Option<String>,
    module: Option<&'a str>,
    outcome: Option<String>,
    criterion: Option<String>,
    experience: Option<String>,
    complexity: Option<String>,
}

fn lowered_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

impl<'a> Predicate<'a> {
    pub fn new(filters: &'a FilterState, ctx: FilterContext<'a>) -> Self {
        Self {
            filters,
            ctx,
            tag: lowered_query(&filters.tag),
            search: lowered_query(&filters.search),
            material: lowered_query(&filters.material),
            module: filters.module.as_deref().map(str::trim),
            outcome: filters.outcome.as_deref().and_then(canonical_value),
            criterion: filters.criterion.as_deref().and_then(canonical_value),
            experience: filters.experience.as_deref().and_then(lowered_query),
            complexity: filters.complexity.as_deref().and_then(lowered_query),
        }
    }

    /// Decide whether a record passes every active clause
    pub fn matches(&self, d: &Dynamic) -> bool {
        let f = self.filters;

        if let Some(track) = f.track {
            if !d.has_track(track.as_str()) {
                return false;
            }
        }
        if !selection_matches(&f.model, &d.model)
            || !selection_matches(&f.category, &d.categoria)
            || !selection_matches(&f.activity_type, &d.tipus_dinamica)
        {
            return false;
        }

        // Missing or zero values satisfy the ceilings
        let minutes = d.temps_total.unwrap_or(0);
        if f.max_minutes < MAX_MINUTES && minutes > f.max_minutes {
            return false;
        }
        if d.soroll.unwrap_or(0) > f.max_noise {
            return false;
        }

        if f.participants > ANY_GROUP_SIZE {
            let min = d.participants_min.unwrap_or(DEFAULT_PARTICIPANTS_MIN);
            let max = d
                .participants_max
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_PARTICIPANTS_MAX);
            if f.participants < min || f.participants > max {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            if !d.tags.iter().any(|t| t.to_lowercase().contains(tag.as_str())) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let in_title = d.title().to_lowercase().contains(search.as_str());
            if !in_title && !d.detail().to_json_string().to_lowercase().contains(search.as_str()) {
                return false;
            }
        }

        if f.favorites_only && !self.ctx.favorites.contains(d.id) {
            return false;
        }

        if f.has_curricular_selection() {
            let paths = curricular_paths(d, &self.ctx.normalizer);
            if !paths.iter().any(|p| self.path_matches(p)) {
                return false;
            }
        }

        match f.digital {
            DigitalFilter::Any => {}
            DigitalFilter::Digital if !d.is_digital() => return false,
            DigitalFilter::NonDigital if d.is_digital() => return false,
            _ => {}
        }

        if let Some(material) = &self.material {
            let text = d
                .materials()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "{}".to_string())
                .to_lowercase();
            if !text.contains(material.as_str()) {
                return false;
            }
        }

        if f.max_vulnerability < MAX_VULNERABILITY {
            if let Some(level) = d.vulnerability_level() {
                if level > f.max_vulnerability {
                    return false;
                }
            }
        }

        if let Some(experience) = &self.experience {
            if d.experience_level() != *experience {
                return false;
            }
        }
        if let Some(complexity) = &self.complexity {
            if d.logistic_complexity() != *complexity {
                return false;
            }
        }

        if f.min_quality > 0.0 {
            let score = self.ctx.quality_scale.to_five_point(d.qualitat.unwrap_or(0.0));
            if score < f.min_quality {
                return false;
            }
        }

        true
    }

    /// A path satisfies the curricular selection when its module matches and,
    /// if an outcome or criterion is selected, one of its outcomes does too
    fn path_matches(&self, path: &ModulePath) -> bool {
        if let Some(module) = self.module {
            if path.module.label != module {
                return false;
            }
        }
        if self.outcome.is_none() && self.criterion.is_none() {
            return true;
        }
        path.outcomes.iter().any(|o| {
            let outcome_ok = self
                .outcome
                .as_ref()
                .map_or(true, |ra| o.value.as_ref() == Some(ra));
            let criterion_ok = self
                .criterion
                .as_ref()
                .map_or(true, |ca| o.criteria.contains(ca));
            outcome_ok && criterion_ok
        })
    }
}

fn selection_matches(selected: &Option<String>, actual: &Option<String>) -> bool {
    match selected {
        None => true,
        Some(s) => actual.as_deref() == Some(s.as_str()),
    }
}

/// Decide inclusion of a single record
pub fn include(record: &Dynamic, filters: &FilterState, ctx: FilterContext<'_>) -> bool {
    Predicate::new(filters, ctx).matches(record)
}

/// Records passing the filters, in input order
pub fn apply_filters<'r>(
    records: &'r [Dynamic],
    filters: &FilterState,
    ctx: FilterContext<'_>,
) -> Vec<&'r Dynamic> {
    let predicate = Predicate::new(filters, ctx);
    records.iter().filter(|d| predicate.matches(d)).collect()
}

impl fmt::Display for DigitalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DigitalFilter::Any => "all",
            DigitalFilter::Digital => "si",
            DigitalFilter::NonDigital => "no",
        })
    }
}
