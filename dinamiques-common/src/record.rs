//! Dynamic record model
//!
//! A dynamic carries a handful of typed catalog fields plus a free-form
//! detail payload. The static document nests the payload under
//! `json_complet`; the API returns it flattened next to the catalog fields.
//! [`Dynamic::detail`] hides that difference from every consumer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_helpers::{self, value_as_f64, value_as_string};

/// One catalog entry ("dinàmica")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dynamic {
    /// Stable identifier; higher means newer
    #[serde(deserialize_with = "serde_helpers::lenient_id::deserialize")]
    pub id: i64,

    #[serde(default, deserialize_with = "serde_helpers::lenient_string::deserialize")]
    pub titol: Option<String>,

    /// Generating source or category of the dynamic
    #[serde(default, deserialize_with = "serde_helpers::lenient_string::deserialize")]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "serde_helpers::lenient_string::deserialize")]
    pub tipus_dinamica: Option<String>,

    #[serde(default, deserialize_with = "serde_helpers::lenient_string::deserialize")]
    pub categoria: Option<String>,

    /// Track tags such as `TIS` or `TAPD`
    #[serde(default, deserialize_with = "serde_helpers::string_list::deserialize")]
    pub target: Vec<String>,

    /// Total duration in minutes
    #[serde(default, deserialize_with = "serde_helpers::lenient_u32::deserialize")]
    pub temps_total: Option<u32>,

    /// Noise level 1-5
    #[serde(default, deserialize_with = "serde_helpers::lenient_u32::deserialize")]
    pub soroll: Option<u32>,

    #[serde(default, deserialize_with = "serde_helpers::lenient_u32::deserialize")]
    pub participants_min: Option<u32>,

    #[serde(default, deserialize_with = "serde_helpers::lenient_u32::deserialize")]
    pub participants_max: Option<u32>,

    #[serde(default, deserialize_with = "serde_helpers::string_list::deserialize")]
    pub tags: Vec<String>,

    /// Raw quality score, on the dataset's declared scale
    #[serde(default, deserialize_with = "serde_helpers::lenient_f64::deserialize")]
    pub qualitat: Option<f64>,

    /// Nested detail payload (static document variant)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_complet: Option<Value>,

    /// Everything else, including the flattened detail payload (API variant)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only view over a dynamic's detail payload
#[derive(Debug, Clone, Copy)]
pub enum Detail<'a> {
    Nested(&'a Map<String, Value>),
    Flattened(&'a Map<String, Value>),
}

impl<'a> Detail<'a> {
    fn map(&self) -> &'a Map<String, Value> {
        match self {
            Detail::Nested(m) | Detail::Flattened(m) => m,
        }
    }

    /// Top-level field of the payload
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map().get(key).filter(|v| !v.is_null())
    }

    /// Nested field, e.g. `path(&["consells_docent", "experiencia_docent"])`
    pub fn path(&self, keys: &[&str]) -> Option<&'a Value> {
        let (first, rest) = keys.split_first()?;
        let mut current = self.get(first)?;
        for key in rest {
            current = current.get(key).filter(|v| !v.is_null())?;
        }
        Some(current)
    }

    /// Compact JSON text of the whole payload
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self.map()).unwrap_or_default()
    }
}

impl Dynamic {
    /// Detail payload, whichever shape the source delivered
    pub fn detail(&self) -> Detail<'_> {
        match self.json_complet.as_ref().and_then(Value::as_object) {
            Some(nested) => Detail::Nested(nested),
            None => Detail::Flattened(&self.extra),
        }
    }

    pub fn title(&self) -> &str {
        self.titol.as_deref().unwrap_or_default()
    }

    pub fn has_track(&self, track: &str) -> bool {
        self.target.iter().any(|t| t.trim().eq_ignore_ascii_case(track))
    }

    /// Emotional-safety level on a 1-5 scale, `None` when not declared
    ///
    /// Numeric levels are taken as declared. Descriptive levels are mapped
    /// heuristically: anything mentioning "alt" is 5, "mitj" is 3, the rest is 1.
    pub fn vulnerability_level(&self) -> Option<u8> {
        let detail = self.detail();
        let raw = detail
            .path(&["espai_i_ambient", "seguretat_emocional"])
            .or_else(|| detail.path(&["seguretat_emocional", "nivell"]))?;
        let raw = match raw {
            Value::Object(obj) => obj.get("nivell")?,
            other => other,
        };
        if let Some(n) = value_as_f64(raw) {
            return Some(n.round().clamp(0.0, u8::MAX as f64) as u8);
        }
        let text = value_as_string(raw)?.to_lowercase();
        if text.trim().is_empty() {
            None
        } else if text.contains("alt") {
            Some(5)
        } else if text.contains("mitj") {
            Some(3)
        } else {
            Some(1)
        }
    }

    /// Facilitator experience required, lower-cased, `baixa` when absent
    pub fn experience_level(&self) -> String {
        self.detail()
            .path(&["consells_docent", "experiencia_docent"])
            .and_then(value_as_string)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_ADVISORY_LEVEL.to_string())
    }

    /// Logistic complexity, lower-cased, `baixa` when absent
    pub fn logistic_complexity(&self) -> String {
        let detail = self.detail();
        detail
            .get("complexitat_logistica")
            .or_else(|| detail.path(&["consells_docent", "complexitat_logistica"]))
            .and_then(value_as_string)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_ADVISORY_LEVEL.to_string())
    }

    /// Materials block of the detail payload
    pub fn materials(&self) -> Option<&Value> {
        self.detail().get("materials")
    }

    /// True when any required material is digital or the dynamic is tagged so
    pub fn is_digital(&self) -> bool {
        let flagged = self
            .materials()
            .and_then(|m| m.get("necessaris"))
            .and_then(Value::as_array)
            .map(|items| items.iter().any(material_is_digital))
            .unwrap_or(false);
        flagged || self.tags.iter().any(|t| t.eq_ignore_ascii_case("digital"))
    }
}

/// Default for advisory fields a dynamic does not declare
pub const DEFAULT_ADVISORY_LEVEL: &str = "baixa";

fn material_is_digital(item: &Value) -> bool {
    match item {
        Value::String(s) => s.to_lowercase().contains("digital"),
        Value::Object(obj) => {
            let flagged = obj.get("es_digital").and_then(Value::as_bool).unwrap_or(false);
            let described = obj
                .get("descripcio")
                .and_then(Value::as_str)
                .map(|d| d.to_lowercase().contains("digital"))
                .unwrap_or(false);
            flagged || described
        }
        _ => false,
    }
}

/// Parse a catalog document: a bare array, or an object wrapping `dinamiques`
pub fn parse_document(bytes: &[u8]) -> crate::Result<Vec<Dynamic>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let list = match value {
        Value::Object(mut obj) => obj
            .remove("dinamiques")
            .ok_or_else(|| crate::Error::InvalidInput("document has no 'dinamiques' array".into()))?,
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}
