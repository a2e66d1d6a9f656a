//! Result ordering
//!
//! All orderings are stable, so records comparing equal keep the order the
//! predicate engine produced them in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::record::Dynamic;

/// Duration used for dynamics without one when sorting by ascending time
pub const MISSING_TIME_SENTINEL: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Descending id; ids are assumed to grow with creation time
    #[default]
    Recent,
    StarsDesc,
    StarsAsc,
    Title,
    TimeAsc,
    TimeDesc,
    ParticipantsAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Recent,
        SortKey::StarsDesc,
        SortKey::StarsAsc,
        SortKey::Title,
        SortKey::TimeAsc,
        SortKey::TimeDesc,
        SortKey::ParticipantsAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::StarsDesc => "stars-desc",
            SortKey::StarsAsc => "stars-asc",
            SortKey::Title => "title",
            SortKey::TimeAsc => "time-asc",
            SortKey::TimeDesc => "time-desc",
            SortKey::ParticipantsAsc => "participants-asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .iter()
            .find(|k| k.as_str() == s.trim())
            .copied()
            .ok_or_else(|| format!("unknown sort key '{}'", s))
    }
}

/// Accent- and case-insensitive key for title ordering
///
/// "Àlbum" sorts next to "album" instead of after "zebra".
pub fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn quality(d: &Dynamic) -> f64 {
    d.qualitat.unwrap_or(0.0)
}

/// Order records in place
pub fn sort_records(records: &mut [&Dynamic], key: SortKey) {
    sort_by_record(records, key, |d| *d);
}

/// Order arbitrary items by the record each one refers to
pub fn sort_by_record<'r, T, F>(items: &mut [T], key: SortKey, record: F)
where
    F: Fn(&T) -> &'r Dynamic,
{
    match key {
        SortKey::Recent => items.sort_by(|a, b| record(b).id.cmp(&record(a).id)),
        SortKey::StarsDesc => items.sort_by(|a, b| quality(record(b)).total_cmp(&quality(record(a)))),
        SortKey::StarsAsc => items.sort_by(|a, b| quality(record(a)).total_cmp(&quality(record(b)))),
        SortKey::Title => items.sort_by_cached_key(|item| {
            let title = record(item).title();
            (collation_key(title), title.to_string())
        }),
        SortKey::TimeAsc => items.sort_by_key(|item| {
            record(item)
                .temps_total
                .filter(|t| *t > 0)
                .unwrap_or(MISSING_TIME_SENTINEL)
        }),
        SortKey::TimeDesc => items.sort_by(|a, b| minutes(record(b)).cmp(&minutes(record(a)))),
        SortKey::ParticipantsAsc => {
            items.sort_by_key(|item| record(item).participants_min.unwrap_or(0))
        }
    }
}

fn minutes(d: &Dynamic) -> u32 {
    d.temps_total.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Dynamic> {
        serde_json::from_value(json!([
            { "id": 1, "titol": "Zoom", "temps_total": 30, "qualitat": 6, "participants_min": 10 },
            { "id": 3, "titol": "Àlbum de grup", "qualitat": 9, "participants_min": 2 },
            { "id": 2, "titol": "agenda", "temps_total": 90, "qualitat": 6 }
        ]))
        .unwrap()
    }

    fn ids(records: &[&Dynamic]) -> Vec<i64> {
        records.iter().map(|d| d.id).collect()
    }

    fn sorted(key: SortKey) -> Vec<i64> {
        let data = records();
        let mut refs: Vec<&Dynamic> = data.iter().collect();
        sort_records(&mut refs, key);
        ids(&refs)
    }

    #[test]
    fn test_recent_is_descending_id() {
        assert_eq!(sorted(SortKey::Recent), vec![3, 2, 1]);
    }

    #[test]
    fn test_stars_sort_is_stable() {
        assert_eq!(sorted(SortKey::StarsDesc), vec![3, 1, 2]);
        assert_eq!(sorted(SortKey::StarsAsc), vec![1, 2, 3]);
    }

    #[test]
    fn test_title_ignores_accents_and_case() {
        assert_eq!(sorted(SortKey::Title), vec![2, 3, 1]);
        assert_eq!(collation_key("Àlbum"), "album");
    }

    #[test]
    fn test_missing_time_sorts_last_ascending() {
        assert_eq!(sorted(SortKey::TimeAsc), vec![1, 2, 3]);
        assert_eq!(sorted(SortKey::TimeDesc), vec![2, 1, 3]);
    }

    #[test]
    fn test_participants_ascending() {
        assert_eq!(sorted(SortKey::ParticipantsAsc), vec![2, 3, 1]);
    }

    #[test]
    fn test_positions_sort_by_borrowed_records() {
        let data = records();
        let mut positions: Vec<usize> = (0..data.len()).collect();
        sort_by_record(&mut positions, SortKey::Recent, |i| &data[*i]);
        assert_eq!(positions, vec![1, 2, 0]);

        sort_by_record(&mut positions, SortKey::Title, |i| &data[*i]);
        assert_eq!(positions, vec![2, 1, 0]);
    }

    #[test]
    fn test_sort_key_names() {
        assert_eq!("stars-desc".parse::<SortKey>(), Ok(SortKey::StarsDesc));
        assert_eq!(serde_json::to_value(SortKey::ParticipantsAsc).unwrap(), json!("participants-asc"));
        assert!("energy".parse::<SortKey>().is_err());
    }
}
