//! Dataset statistics for the status panel and the model/type dropdowns

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::connection::curricular_paths;
use crate::curriculum::{Normalizer, Track};
use crate::record::Dynamic;

/// Modules listed in the "most used" ranking
pub const TOP_MODULES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    /// Records tagged for each track; a record may count for both
    pub per_track: BTreeMap<String, usize>,
    pub per_model: Vec<NamedCount>,
    pub per_type: Vec<NamedCount>,
    /// Module labels referenced by the most records
    pub top_modules: Vec<NamedCount>,
}

/// Count by name, most frequent first, ties by name
fn ranked<'a>(names: impl Iterator<Item = &'a str>) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}

pub fn model_counts(records: &[Dynamic]) -> Vec<NamedCount> {
    ranked(records.iter().filter_map(|d| d.model.as_deref()))
}

pub fn type_counts(records: &[Dynamic]) -> Vec<NamedCount> {
    ranked(records.iter().filter_map(|d| d.tipus_dinamica.as_deref()))
}

/// Sorted distinct models, for the model dropdown
pub fn distinct_models(records: &[Dynamic]) -> Vec<String> {
    distinct(records.iter().filter_map(|d| d.model.as_deref()))
}

/// Sorted distinct activity types, for the type dropdown
pub fn distinct_types(records: &[Dynamic]) -> Vec<String> {
    distinct(records.iter().filter_map(|d| d.tipus_dinamica.as_deref()))
}

/// Sorted distinct categories, for the category dropdown
pub fn distinct_categories(records: &[Dynamic]) -> Vec<String> {
    distinct(records.iter().filter_map(|d| d.categoria.as_deref()))
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn dataset_stats(records: &[Dynamic], normalizer: &Normalizer) -> DatasetStats {
    let per_track = Track::ALL
        .iter()
        .map(|track| {
            let count = records.iter().filter(|d| d.has_track(track.as_str())).count();
            (track.as_str().to_string(), count)
        })
        .collect();

    let labels: Vec<String> = records
        .iter()
        .flat_map(|d| {
            curricular_paths(d, normalizer)
                .into_iter()
                .map(|p| p.module.label)
                .collect::<BTreeSet<_>>()
        })
        .collect();
    let mut top_modules = ranked(labels.iter().map(String::as_str));
    top_modules.truncate(TOP_MODULES);

    DatasetStats {
        total: records.len(),
        per_track,
        per_model: model_counts(records),
        per_type: type_counts(records),
        top_modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Dynamic> {
        serde_json::from_value(json!([
            { "id": 1, "model": "gpt", "tipus_dinamica": "joc", "target": ["TIS"],
              "connexio_curricular": { "modul_codi": "MP09", "modul": "Habilitats socials" } },
            { "id": 2, "model": "claude", "tipus_dinamica": "joc", "target": ["TIS", "TAPD"] },
            { "id": 3, "model": "claude", "tipus_dinamica": "debat", "target": ["TAPD"],
              "connexio_curricular": { "moduls": [
                  { "codi": "MP02", "nom": "Atenció sanitària" },
                  { "codi": "MP02", "nom": "Atenció sanitària" }
              ]} }
        ]))
        .unwrap()
    }

    #[test]
    fn test_counts_ranked_by_frequency_then_name() {
        let counts = model_counts(&records());
        assert_eq!(counts[0], NamedCount { name: "claude".into(), count: 2 });
        assert_eq!(counts[1], NamedCount { name: "gpt".into(), count: 1 });
        assert_eq!(type_counts(&records())[0].name, "joc");
    }

    #[test]
    fn test_distinct_lists_are_sorted() {
        assert_eq!(distinct_models(&records()), vec!["claude", "gpt"]);
        assert_eq!(distinct_types(&records()), vec!["debat", "joc"]);
        assert!(distinct_categories(&records()).is_empty());
    }

    #[test]
    fn test_dataset_stats() {
        let stats = dataset_stats(&records(), &Normalizer::default());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.per_track["TIS"], 2);
        assert_eq!(stats.per_track["TAPD"], 2);
        // a record referencing a module twice counts once
        assert_eq!(stats.top_modules.len(), 2);
        assert!(stats.top_modules.iter().all(|m| m.count == 1));
    }
}
