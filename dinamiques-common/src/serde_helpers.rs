//! Lenient deserializers for hand-authored catalog documents
//!
//! Dynamics are written by several generators, so a numeric field may arrive
//! as a number, a numeric string or null, and a list may be null or a bare
//! scalar. These helpers map all of those onto plain Rust types instead of
//! rejecting the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON scalar as a number
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

/// Interpret a JSON scalar as text (numbers and booleans are stringified)
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a JSON value as a list of strings; a scalar becomes a singleton
pub fn value_as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_as_string).collect(),
        Value::Null => Vec::new(),
        other => value_as_string(other).into_iter().collect(),
    }
}

pub mod lenient_f64 {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(value_as_f64).filter(|v| v.is_finite()))
    }
}

pub mod lenient_u32 {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(value_as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round().min(u32::MAX as f64) as u32))
    }
}

pub mod lenient_id {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| serde::de::Error::custom(format!("invalid dynamic id: {}", value)))
    }
}

pub mod lenient_string {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(value_as_string)
            .filter(|s| !s.trim().is_empty()))
    }
}

pub mod string_list {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(value_as_string_list).unwrap_or_default())
    }
}
