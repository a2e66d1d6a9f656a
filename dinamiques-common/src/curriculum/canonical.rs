//! Canonical module table for the two vocational tracks
//!
//! Both tracks number their modules MP01..MP14, so a code alone never
//! identifies a module. The name is the discriminator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vocational program track a module or a dynamic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Track {
    /// Tècnic Superior en Integració Social
    #[serde(rename = "TIS")]
    Tis,
    /// Tècnic en Atenció a Persones en Situació de Dependència
    #[serde(rename = "TAPD")]
    Tapd,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Tis, Track::Tapd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Tis => "TIS",
            Track::Tapd => "TAPD",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TIS" => Ok(Track::Tis),
            "TAPD" => Ok(Track::Tapd),
            other => Err(format!("unknown track '{}'", other)),
        }
    }
}

/// Resolved cycle of a normalized module
///
/// `Unresolved` renders as `?` in labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cycle {
    #[serde(rename = "TIS")]
    Tis,
    #[serde(rename = "TAPD")]
    Tapd,
    #[serde(rename = "?")]
    Unresolved,
}

impl Cycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Tis => "TIS",
            Cycle::Tapd => "TAPD",
            Cycle::Unresolved => "?",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Cycle::Unresolved)
    }

    /// True when this cycle is the given track
    pub fn is(&self, track: Track) -> bool {
        *self == Cycle::from(track)
    }
}

impl From<Track> for Cycle {
    fn from(track: Track) -> Self {
        match track {
            Track::Tis => Cycle::Tis,
            Track::Tapd => Cycle::Tapd,
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the canonical curriculum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalModule {
    pub code: &'static str,
    pub name: &'static str,
    pub track: Track,
}

impl CanonicalModule {
    const fn new(code: &'static str, name: &'static str, track: Track) -> Self {
        Self { code, name, track }
    }
}

/// Authoritative module list, TIS first then TAPD
///
/// Table order is the tie-break for every lookup that scans it.
pub static CANONICAL_MODULES: [CanonicalModule; 28] = [
    CanonicalModule::new("MP01", "Context de la intervenció social", Track::Tis),
    CanonicalModule::new("MP02", "Metodologia de la intervenció social", Track::Tis),
    CanonicalModule::new("MP03", "Promoció de l'autonomia personal", Track::Tis),
    CanonicalModule::new("MP04", "Inserció sociolaboral", Track::Tis),
    CanonicalModule::new("MP05", "Sistemes augmentatius i alternatius de comunicació", Track::Tis),
    CanonicalModule::new("MP06", "Atenció a les unitats de convivència", Track::Tis),
    CanonicalModule::new("MP07", "Suport a la intervenció educativa", Track::Tis),
    CanonicalModule::new("MP08", "Mediació comunitària", Track::Tis),
    CanonicalModule::new("MP09", "Habilitats socials", Track::Tis),
    CanonicalModule::new("MP10", "Primers auxilis", Track::Tis),
    CanonicalModule::new("MP11", "Formació i orientació laboral", Track::Tis),
    CanonicalModule::new("MP12", "Empresa i iniciativa emprenedora", Track::Tis),
    CanonicalModule::new("MP13", "Projecte d'integració social", Track::Tis),
    CanonicalModule::new("MP14", "Formació en centres de treball", Track::Tis),
    CanonicalModule::new(
        "MP01",
        "Organització de l'atenció a les persones en situació de dependència",
        Track::Tapd,
    ),
    CanonicalModule::new("MP02", "Atenció sanitària", Track::Tapd),
    CanonicalModule::new("MP03", "Atenció higiènica", Track::Tapd),
    CanonicalModule::new("MP04", "Atenció i suport psicosocial", Track::Tapd),
    CanonicalModule::new(
        "MP05",
        "Característiques i necessitats de les persones en situació de dependència",
        Track::Tapd,
    ),
    CanonicalModule::new("MP06", "Teleassistència", Track::Tapd),
    CanonicalModule::new("MP07", "Suport domiciliari", Track::Tapd),
    CanonicalModule::new("MP08", "Suport a la comunicació", Track::Tapd),
    CanonicalModule::new("MP09", "Destreses socials", Track::Tapd),
    CanonicalModule::new("MP10", "Primers auxilis", Track::Tapd),
    CanonicalModule::new("MP11", "Formació i orientació laboral", Track::Tapd),
    CanonicalModule::new("MP12", "Empresa i iniciativa emprenedora", Track::Tapd),
    CanonicalModule::new("MP13", "Síntesi", Track::Tapd),
    CanonicalModule::new("MP14", "Formació en centres de treball", Track::Tapd),
];

/// Look up the canonical entry for a code within one track
pub fn find(code: &str, track: Track) -> Option<&'static CanonicalModule> {
    CANONICAL_MODULES
        .iter()
        .find(|m| m.track == track && m.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_no_duplicate_code_track_pairs() {
        let mut seen = HashSet::new();
        for m in CANONICAL_MODULES.iter() {
            assert!(seen.insert((m.code, m.track)), "duplicate {} {}", m.code, m.track);
        }
    }

    #[test]
    fn test_each_track_has_fourteen_modules() {
        for track in Track::ALL {
            let count = CANONICAL_MODULES.iter().filter(|m| m.track == track).count();
            assert_eq!(count, 14);
        }
    }

    #[test]
    fn test_track_parsing() {
        assert_eq!(" tis ".parse::<Track>(), Ok(Track::Tis));
        assert_eq!("TAPD".parse::<Track>(), Ok(Track::Tapd));
        assert!("all".parse::<Track>().is_err());
    }

    #[test]
    fn test_find_is_track_scoped() {
        assert_eq!(find("mp09", Track::Tis).map(|m| m.name), Some("Habilitats socials"));
        assert_eq!(find("MP09", Track::Tapd).map(|m| m.name), Some("Destreses socials"));
        assert!(find("MP99", Track::Tis).is_none());
    }
}
