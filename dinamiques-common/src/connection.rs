//! Curricular connection accessor
//!
//! A dynamic declares its curricular connection in one of two shapes:
//!
//! - nested: `connexio_curricular.unitats_formatives[]` (or `moduls[]`), each
//!   unit with `resultats_aprenentatge[]`, each outcome with
//!   `criteris_avaluacio[]`
//! - flat (legacy): `connexio_curricular.modul_codi`, `modul`, `ra`, `ca`
//!
//! [`CurricularConnection`] parses either shape, and [`curricular_paths`]
//! flattens both into the same module → outcome → criteria paths. The index
//! builder and the predicate engine only ever look at paths.

use serde_json::Value;

use crate::curriculum::{NormalizedModule, Normalizer};
use crate::record::Dynamic;
use crate::serde_helpers::{value_as_string, value_as_string_list};

/// One unit of the nested schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub code: Option<String>,
    pub name: Option<String>,
    pub outcomes: Vec<Outcome>,
}

/// One learning outcome of the nested schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub code: Option<String>,
    pub description: Option<String>,
    pub criteria: Vec<String>,
}

/// The single module reference of the flat schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatModule {
    pub code: Option<String>,
    pub name: Option<String>,
    pub outcome: Option<String>,
    pub criteria: Vec<String>,
}

/// Curricular connection of a dynamic, in whichever shape it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurricularConnection {
    Nested(Vec<Unit>),
    Flat(FlatModule),
}

impl CurricularConnection {
    /// Parse the connection block of a dynamic
    ///
    /// A non-empty unit list selects the nested shape; anything else is read
    /// as the flat shape, whose fields may all be absent.
    pub fn of(record: &Dynamic) -> Self {
        let block = record.detail().get("connexio_curricular");
        let field = |key: &str| block.and_then(|b| b.get(key)).filter(|v| !v.is_null());

        let units = field("unitats_formatives")
            .or_else(|| field("moduls"))
            .and_then(Value::as_array)
            .filter(|units| !units.is_empty());

        if let Some(units) = units {
            return CurricularConnection::Nested(units.iter().map(parse_unit).collect());
        }

        CurricularConnection::Flat(FlatModule {
            code: field("modul_codi").and_then(non_blank),
            name: field("modul").and_then(non_blank),
            outcome: field("ra").and_then(non_blank),
            criteria: field("ca").map(value_as_string_list).unwrap_or_default(),
        })
    }
}

fn non_blank(value: &Value) -> Option<String> {
    value_as_string(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_unit(value: &Value) -> Unit {
    let outcomes = value
        .get("resultats_aprenentatge")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|r| Outcome {
                    code: r.get("codi").and_then(non_blank),
                    description: r.get("descripcio").and_then(non_blank),
                    criteria: r
                        .get("criteris_avaluacio")
                        .map(value_as_string_list)
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Unit {
        code: value.get("codi").and_then(non_blank),
        name: value.get("nom").and_then(non_blank),
        outcomes,
    }
}

/// Canonical form of an outcome or criterion value: trimmed, upper-cased
pub fn canonical_value(raw: &str) -> Option<String> {
    let value = raw.trim().to_uppercase();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn canonical_criteria(raw: &[String]) -> Vec<String> {
    raw.iter().filter_map(|c| canonical_value(c)).collect()
}

/// Outcome reached through a module path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomePath {
    /// Outcome code, or its description when it has no code; `None` when neither
    pub value: Option<String>,
    pub criteria: Vec<String>,
}

/// Module reached by a dynamic, with the outcomes declared under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    pub module: NormalizedModule,
    pub outcomes: Vec<OutcomePath>,
}

/// Flatten a dynamic's curricular connection into normalized paths
///
/// Module cycles left unresolved by the normalizer are upgraded from the
/// dynamic's own track tags when exactly one is declared. A flat connection
/// without module code and name yields no path at all.
pub fn curricular_paths(record: &Dynamic, normalizer: &Normalizer) -> Vec<ModulePath> {
    let resolve = |code: Option<&str>, name: Option<&str>| {
        normalizer
            .normalize(code, name)
            .map(|m| m.upgrade_cycle(record.target.as_slice()))
    };

    match CurricularConnection::of(record) {
        CurricularConnection::Nested(units) => units
            .iter()
            .filter_map(|unit| {
                let module = resolve(unit.code.as_deref(), unit.name.as_deref())?;
                let outcomes = unit
                    .outcomes
                    .iter()
                    .map(|o| OutcomePath {
                        value: o
                            .code
                            .as_deref()
                            .or(o.description.as_deref())
                            .and_then(canonical_value),
                        criteria: canonical_criteria(&o.criteria),
                    })
                    .collect();
                Some(ModulePath { module, outcomes })
            })
            .collect(),
        CurricularConnection::Flat(flat) => resolve(flat.code.as_deref(), flat.name.as_deref())
            .map(|module| ModulePath {
                module,
                outcomes: vec![OutcomePath {
                    value: flat.outcome.as_deref().and_then(canonical_value),
                    criteria: canonical_criteria(&flat.criteria),
                }],
            })
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Cycle;
    use serde_json::json;

    fn dynamic(value: Value) -> Dynamic {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_nested_shape_paths() {
        let d = dynamic(json!({
            "id": 1,
            "target": ["TIS"],
            "json_complet": { "connexio_curricular": { "unitats_formatives": [{
                "codi": "MP09",
                "nom": "Habilitats socials",
                "resultats_aprenentatge": [
                    { "codi": "ra1", "criteris_avaluacio": ["ca1.a", " CA1.b "] },
                    { "descripcio": "Aplica tècniques", "criteris_avaluacio": [] }
                ]
            }]}}
        }));
        let paths = curricular_paths(&d, &Normalizer::default());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].module.label, "MP09 - Habilitats socials [TIS]");
        assert_eq!(paths[0].outcomes[0].value.as_deref(), Some("RA1"));
        assert_eq!(paths[0].outcomes[0].criteria, vec!["CA1.A", "CA1.B"]);
        assert_eq!(paths[0].outcomes[1].value.as_deref(), Some("APLICA TÈCNIQUES"));
    }

    #[test]
    fn test_moduls_alias_is_nested() {
        let d = dynamic(json!({
            "id": 1,
            "connexio_curricular": { "moduls": [{ "codi": "MP02", "nom": "Atenció sanitària" }] }
        }));
        assert!(matches!(CurricularConnection::of(&d), CurricularConnection::Nested(_)));
    }

    #[test]
    fn test_flat_shape_with_scalar_criterion() {
        let d = dynamic(json!({
            "id": 2,
            "target": ["TAPD"],
            "json_complet": { "connexio_curricular": {
                "modul_codi": "MP07", "modul": "Dinàmica de grup", "ra": " ra2 ", "ca": "ca2.c"
            }}
        }));
        let paths = curricular_paths(&d, &Normalizer::default());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].module.cycle, Cycle::Tapd);
        assert_eq!(paths[0].outcomes[0].value.as_deref(), Some("RA2"));
        assert_eq!(paths[0].outcomes[0].criteria, vec!["CA2.C"]);
    }

    #[test]
    fn test_empty_flat_connection_has_no_paths() {
        let d = dynamic(json!({
            "id": 3,
            "json_complet": { "connexio_curricular": { "modul_codi": "", "modul": "" } }
        }));
        assert!(curricular_paths(&d, &Normalizer::default()).is_empty());
        assert!(curricular_paths(&dynamic(json!({ "id": 4 })), &Normalizer::default()).is_empty());
    }

    #[test]
    fn test_empty_unit_list_falls_back_to_flat() {
        let d = dynamic(json!({
            "id": 5,
            "connexio_curricular": { "unitats_formatives": [], "modul_codi": "MP03", "modul": "Atenció higiènica" }
        }));
        let paths = curricular_paths(&d, &Normalizer::default());
        assert_eq!(paths[0].module.label, "MP03 - Atenció higiènica [TAPD]");
    }
}
