//! Curricular index and cascading dropdown options
//!
//! Built in one pass over the loaded dynamics and rebuilt in full on every
//! load. Holds the distinct module labels, outcome values and criterion
//! values, plus a link table recording each outcome's parent module and each
//! criterion's parent outcome and module. The link table drives the
//! module → outcome → criterion cascade.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::connection::curricular_paths;
use crate::curriculum::{Cycle, Normalizer, Track};
use crate::filter::FilterState;
use crate::record::Dynamic;

/// One link of the curricular index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkEntry {
    Mp {
        value: String,
        cycle: Cycle,
    },
    Ra {
        value: String,
        parent_mp: String,
    },
    Ca {
        value: String,
        parent_mp: String,
        /// `None` for criteria declared without an outcome (flat schema)
        parent_ra: Option<String>,
    },
}

/// Distinct curricular values of a dataset and their parent links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurricularIndex {
    pub modules: BTreeSet<String>,
    pub outcomes: BTreeSet<String>,
    pub criteria: BTreeSet<String>,
    pub links: Vec<LinkEntry>,
}

/// Option lists for the three curricular dropdowns, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropdownOptions {
    pub modules: Vec<String>,
    pub outcomes: Vec<String>,
    pub criteria: Vec<String>,
}

/// Build the index with the default normalizer
pub fn build_index(records: &[Dynamic]) -> CurricularIndex {
    build_index_with(records, &Normalizer::default())
}

/// Build the index from every dynamic's curricular paths
pub fn build_index_with(records: &[Dynamic], normalizer: &Normalizer) -> CurricularIndex {
    let mut index = CurricularIndex::default();
    let mut seen = HashSet::new();
    let mut push = |links: &mut Vec<LinkEntry>, entry: LinkEntry| {
        if seen.insert(entry.clone()) {
            links.push(entry);
        }
    };

    for record in records {
        for path in curricular_paths(record, normalizer) {
            let mp = path.module.label;
            index.modules.insert(mp.clone());
            push(
                &mut index.links,
                LinkEntry::Mp {
                    value: mp.clone(),
                    cycle: path.module.cycle,
                },
            );

            for outcome in path.outcomes {
                if let Some(ra) = &outcome.value {
                    index.outcomes.insert(ra.clone());
                    push(
                        &mut index.links,
                        LinkEntry::Ra {
                            value: ra.clone(),
                            parent_mp: mp.clone(),
                        },
                    );
                }
                for ca in outcome.criteria {
                    index.criteria.insert(ca.clone());
                    push(
                        &mut index.links,
                        LinkEntry::Ca {
                            value: ca,
                            parent_mp: mp.clone(),
                            parent_ra: outcome.value.clone(),
                        },
                    );
                }
            }
        }
    }

    debug!(
        records = records.len(),
        modules = index.modules.len(),
        outcomes = index.outcomes.len(),
        criteria = index.criteria.len(),
        links = index.links.len(),
        "Curricular index built"
    );

    index
}

impl CurricularIndex {
    /// Module labels valid for a track (all modules when unrestricted)
    ///
    /// Modules whose cycle stayed unresolved never match a specific track.
    pub fn module_options(&self, track: Option<Track>) -> BTreeSet<&str> {
        match track {
            None => self.modules.iter().map(String::as_str).collect(),
            Some(track) => self
                .links
                .iter()
                .filter_map(|link| match link {
                    LinkEntry::Mp { value, cycle } if cycle.is(track) => Some(value.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Outcomes declared under a module (all outcomes when unrestricted)
    pub fn outcome_options(&self, module: Option<&str>) -> BTreeSet<&str> {
        match module {
            None => self.outcomes.iter().map(String::as_str).collect(),
            Some(module) => self
                .links
                .iter()
                .filter_map(|link| match link {
                    LinkEntry::Ra { value, parent_mp } if parent_mp == module => {
                        Some(value.as_str())
                    }
                    _ => None,
                })
                .collect(),
        }
    }

    /// Criteria declared under the selected module and outcome
    pub fn criterion_options(&self, module: Option<&str>, outcome: Option<&str>) -> BTreeSet<&str> {
        self.links
            .iter()
            .filter_map(|link| match link {
                LinkEntry::Ca {
                    value,
                    parent_mp,
                    parent_ra,
                } => {
                    let module_ok = module.map_or(true, |m| parent_mp == m);
                    let outcome_ok = outcome.map_or(true, |r| parent_ra.as_deref() == Some(r));
                    (module_ok && outcome_ok).then_some(value.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Compute the cascading dropdowns for the current filters
    ///
    /// Each level is narrowed by the selections above it. A selection that
    /// falls outside its narrowed option set is reset to unrestricted before
    /// the next level is computed.
    pub fn cascade(&self, filters: &mut FilterState) -> DropdownOptions {
        let modules = self.module_options(filters.track);
        if let Some(selected) = &filters.module {
            if !modules.contains(selected.as_str()) {
                debug!(module = %selected, "Resetting stale module selection");
                filters.module = None;
            }
        }

        let outcomes = self.outcome_options(filters.module.as_deref());
        if let Some(selected) = &filters.outcome {
            if !outcomes.contains(selected.as_str()) {
                debug!(outcome = %selected, "Resetting stale outcome selection");
                filters.outcome = None;
            }
        }

        let criteria = self.criterion_options(filters.module.as_deref(), filters.outcome.as_deref());
        if let Some(selected) = &filters.criterion {
            if !criteria.contains(selected.as_str()) {
                debug!(criterion = %selected, "Resetting stale criterion selection");
                filters.criterion = None;
            }
        }

        DropdownOptions {
            modules: modules.into_iter().map(str::to_string).collect(),
            outcomes: outcomes.into_iter().map(str::to_string).collect(),
            criteria: criteria.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Dynamic> {
        serde_json::from_value(json!([
            {
                "id": 1,
                "target": ["TIS"],
                "json_complet": { "connexio_curricular": { "unitats_formatives": [{
                    "codi": "MP09", "nom": "Habilitats socials",
                    "resultats_aprenentatge": [{ "codi": "RA1", "criteris_avaluacio": ["CA1.a", "CA1.b"] }]
                }]}}
            },
            {
                "id": 2,
                "target": ["TAPD"],
                "json_complet": { "connexio_curricular": {
                    "modul_codi": "MP02", "modul": "Atenció sanitària", "ra": "ra3", "ca": ["ca3.a"]
                }}
            },
            {
                "id": 3,
                "target": ["TIS", "TAPD"],
                "json_complet": { "connexio_curricular": { "modul_codi": "MP77", "modul": "Taller lliure" } }
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_index_sets() {
        let index = build_index(&records());
        assert_eq!(index.modules.len(), 3);
        assert!(index.modules.contains("MP77 - Taller lliure [?]"));
        assert_eq!(index.outcomes.iter().collect::<Vec<_>>(), vec!["RA1", "RA3"]);
        assert_eq!(index.criteria.len(), 3);
    }

    #[test]
    fn test_parent_links_are_consistent() {
        let index = build_index(&records());
        for link in &index.links {
            if let LinkEntry::Ca { parent_mp, parent_ra, .. } = link {
                assert!(index.modules.contains(parent_mp));
                if let Some(ra) = parent_ra {
                    assert!(index.outcomes.contains(ra));
                }
            }
            if let LinkEntry::Ra { parent_mp, .. } = link {
                assert!(index.modules.contains(parent_mp));
            }
        }
    }

    #[test]
    fn test_module_options_by_track() {
        let index = build_index(&records());
        let tis = index.module_options(Some(Track::Tis));
        assert_eq!(tis.into_iter().collect::<Vec<_>>(), vec!["MP09 - Habilitats socials [TIS]"]);
        // unresolved modules only show when the track is unrestricted
        assert_eq!(index.module_options(None).len(), 3);
    }

    #[test]
    fn test_cascade_narrows_and_resets() {
        let index = build_index(&records());
        let mut filters = FilterState {
            module: Some("MP09 - Habilitats socials [TIS]".into()),
            outcome: Some("RA3".into()),
            criterion: Some("CA1.A".into()),
            ..FilterState::default()
        };
        let options = index.cascade(&mut filters);
        assert_eq!(options.outcomes, vec!["RA1"]);
        assert_eq!(filters.outcome, None);
        assert_eq!(options.criteria, vec!["CA1.A", "CA1.B"]);
        assert_eq!(filters.criterion.as_deref(), Some("CA1.A"));

        filters.track = Some(Track::Tapd);
        let options = index.cascade(&mut filters);
        assert_eq!(filters.module, None);
        assert_eq!(options.modules, vec!["MP02 - Atenció sanitària [TAPD]"]);
    }
}
