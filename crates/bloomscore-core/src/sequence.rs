//! Course configuration parser.
//!
//! Loads the `Sequence` (course outcomes and modules) and `FormData` (course
//! metadata) payloads, and validates the resulting course design.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::model::{CourseDesign, CourseOutcome, Module};

/// Course metadata (institution, branch, course code, ...), carried through
/// to the report without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(pub BTreeMap<String, Value>);

impl FormData {
    /// A string field, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// One raw `Sequence` entry.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    weight: Option<Value>,
    #[serde(default)]
    hours: Option<Value>,
    #[serde(default)]
    blooms: Option<Value>,
}

/// Parse a `Sequence` JSON string into a course design.
pub fn parse_sequence_str(content: &str) -> std::result::Result<CourseDesign, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(ConfigError::InvalidSequence)?;
    if !value.is_array() {
        return Err(ConfigError::UnexpectedShape {
            payload: "Sequence",
            expected: "array",
        });
    }
    let entries: Vec<RawEntry> =
        serde_json::from_value(value).map_err(ConfigError::InvalidSequence)?;

    let mut design = CourseDesign::default();
    let mut seen = HashSet::new();

    for entry in entries {
        let number = first_number(&entry.name);
        match entry.kind.trim().to_lowercase().as_str() {
            "co" => {
                let Some(number) = number else {
                    tracing::warn!("skipping CO entry without a number: '{}'", entry.name);
                    continue;
                };
                let outcome = CourseOutcome {
                    key: format!("CO{number}"),
                    number,
                    weight: quantity(entry.weight.as_ref(), "weight", &entry.name),
                    blooms: bloom_names(entry.blooms.as_ref()),
                };
                if !seen.insert(outcome.key.clone()) {
                    design.duplicate_keys.push(outcome.key.clone());
                }
                match design.outcomes.iter_mut().find(|co| co.key == outcome.key) {
                    Some(existing) => *existing = outcome,
                    None => design.outcomes.push(outcome),
                }
            }
            "module" => {
                let key = match number {
                    Some(n) => format!("M{n}"),
                    None if !entry.name.trim().is_empty() => entry.name.trim().to_string(),
                    None => {
                        tracing::warn!("skipping module entry without a name");
                        continue;
                    }
                };
                let module = Module {
                    key,
                    hours: quantity(entry.hours.as_ref(), "hours", &entry.name),
                };
                if !seen.insert(module.key.clone()) {
                    design.duplicate_keys.push(module.key.clone());
                }
                match design.modules.iter_mut().find(|m| m.key == module.key) {
                    Some(existing) => *existing = module,
                    None => design.modules.push(module),
                }
            }
            other => {
                tracing::warn!(
                    "skipping sequence entry '{}' with unknown type '{other}'",
                    entry.name
                );
            }
        }
    }

    tracing::debug!(
        outcomes = design.outcomes.len(),
        modules = design.modules.len(),
        "parsed course sequence"
    );

    Ok(design)
}

/// Parse a `FormData` JSON string.
pub fn parse_form_data_str(content: &str) -> std::result::Result<FormData, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(ConfigError::InvalidFormData)?;
    match value {
        Value::Object(map) => Ok(FormData(map.into_iter().collect())),
        _ => Err(ConfigError::UnexpectedShape {
            payload: "FormData",
            expected: "object",
        }),
    }
}

/// Read and parse a `Sequence` JSON file.
pub fn load_sequence(path: &Path) -> Result<CourseDesign> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sequence file: {}", path.display()))?;
    parse_sequence_str(&content)
        .with_context(|| format!("failed to parse sequence: {}", path.display()))
}

/// Read and parse a `FormData` JSON file.
pub fn load_form_data(path: &Path) -> Result<FormData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form data file: {}", path.display()))?;
    parse_form_data_str(&content)
        .with_context(|| format!("failed to parse form data: {}", path.display()))
}

/// First run of ASCII digits in `s`, e.g. `"Course Outcome 12"` → 12.
pub(crate) fn first_number(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Weight/hours value: numbers or numeric strings, anything else is 0.
fn quantity(value: Option<&Value>, field: &str, entry: &str) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            tracing::warn!("'{entry}': {field} {v} is not a non-negative number, using 0");
            0.0
        }
        None => {
            if value.is_some_and(|v| !v.is_null()) {
                tracing::warn!("'{entry}': unparseable {field}, using 0");
            }
            0.0
        }
    }
}

/// `blooms` as a single string or an array of strings, lowercased.
fn bloom_names(value: Option<&Value>) -> Vec<String> {
    let normalize = |s: &str| s.trim().to_lowercase();
    match value {
        Some(Value::String(s)) => vec![normalize(s)],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(normalize)
            .collect(),
        _ => Vec::new(),
    }
}

/// A warning from course design validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The CO or module key (if applicable).
    pub key: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a course design for common authoring mistakes.
///
/// None of these stop an evaluation; they explain scores that look off.
pub fn validate_course_design(design: &CourseDesign) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if design.outcomes.is_empty() {
        warnings.push(ValidationWarning {
            key: None,
            message: "no course outcomes declared".into(),
        });
    }
    if design.modules.is_empty() {
        warnings.push(ValidationWarning {
            key: None,
            message: "no modules declared".into(),
        });
    }

    for key in &design.duplicate_keys {
        warnings.push(ValidationWarning {
            key: Some(key.clone()),
            message: format!("{key} declared more than once, the last declaration is used"),
        });
    }

    let total_weight = design.total_weight();
    if !design.outcomes.is_empty() && (total_weight - 100.0).abs() > 0.01 {
        warnings.push(ValidationWarning {
            key: None,
            message: format!("CO weights sum to {total_weight:.1}%, expected 100%"),
        });
    }

    for co in &design.outcomes {
        if co.weight == 0.0 {
            warnings.push(ValidationWarning {
                key: Some(co.key.clone()),
                message: "weight is zero".into(),
            });
        }
        match co.blooms.first() {
            None => warnings.push(ValidationWarning {
                key: Some(co.key.clone()),
                message: "no target Bloom's level".into(),
            }),
            Some(name) if co.target().is_none() => warnings.push(ValidationWarning {
                key: Some(co.key.clone()),
                message: format!("'{name}' is not a Bloom's level, questions cannot be aligned"),
            }),
            Some(_) => {}
        }
    }

    for module in &design.modules {
        if module.hours == 0.0 {
            warnings.push(ValidationWarning {
                key: Some(module.key.clone()),
                message: "teaching hours are zero".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BloomLevel;

    const SEQUENCE: &str = r#"[
        {"name": "CO1", "type": "CO", "weight": 60, "blooms": ["Apply"]},
        {"name": "CO2", "type": "CO", "weight": "40", "blooms": "Analyze"},
        {"name": "Module 1", "type": "Module", "hours": 10},
        {"name": "Lab Work", "type": "Module", "hours": "4"}
    ]"#;

    #[test]
    fn parse_valid_sequence() {
        let design = parse_sequence_str(SEQUENCE).unwrap();
        assert_eq!(design.outcomes.len(), 2);
        assert_eq!(design.outcomes[0].key, "CO1");
        assert_eq!(design.outcomes[0].weight, 60.0);
        assert_eq!(design.outcomes[0].blooms, vec!["apply"]);
        assert_eq!(design.outcomes[1].weight, 40.0);
        assert_eq!(design.outcomes[1].target(), Some(BloomLevel::Analyze));

        assert_eq!(design.modules.len(), 2);
        assert_eq!(design.modules[0].key, "M1");
        assert_eq!(design.modules[1].key, "Lab Work");
        assert_eq!(design.modules[1].hours, 4.0);
    }

    #[test]
    fn missing_and_garbage_quantities_default_to_zero() {
        let design = parse_sequence_str(
            r#"[
                {"name": "CO1", "type": "CO", "blooms": "apply"},
                {"name": "CO2", "type": "CO", "weight": "lots", "blooms": ["apply"]},
                {"name": "M1", "type": "Module", "hours": null},
                {"name": "M2", "type": "Module", "hours": -3}
            ]"#,
        )
        .unwrap();
        assert_eq!(design.outcomes[0].weight, 0.0);
        assert_eq!(design.outcomes[1].weight, 0.0);
        assert_eq!(design.modules[0].hours, 0.0);
        assert_eq!(design.modules[1].hours, 0.0);
    }

    #[test]
    fn non_string_blooms_are_dropped() {
        let design = parse_sequence_str(
            r#"[{"name": "CO1", "type": "CO", "weight": 100, "blooms": [3, "Create", null]}]"#,
        )
        .unwrap();
        assert_eq!(design.outcomes[0].blooms, vec!["create"]);
    }

    #[test]
    fn co_without_number_is_skipped() {
        let design = parse_sequence_str(
            r#"[{"name": "Outcome", "type": "CO", "weight": 100, "blooms": "apply"}]"#,
        )
        .unwrap();
        assert!(design.outcomes.is_empty());
    }

    #[test]
    fn duplicate_key_keeps_first_position() {
        let design = parse_sequence_str(
            r#"[
                {"name": "CO1", "type": "CO", "weight": 10, "blooms": "apply"},
                {"name": "CO2", "type": "CO", "weight": 50, "blooms": "create"},
                {"name": "CO1", "type": "CO", "weight": 50, "blooms": "remember"}
            ]"#,
        )
        .unwrap();
        assert_eq!(design.outcomes.len(), 2);
        assert_eq!(design.outcomes[0].key, "CO1");
        assert_eq!(design.outcomes[0].weight, 50.0);
        assert_eq!(design.duplicate_keys, vec!["CO1"]);
    }

    #[test]
    fn malformed_sequence_is_an_error() {
        assert!(matches!(
            parse_sequence_str("[{not json"),
            Err(ConfigError::InvalidSequence(_))
        ));
        assert!(matches!(
            parse_sequence_str(r#"{"name": "CO1"}"#),
            Err(ConfigError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn form_data_must_be_an_object() {
        let form = parse_form_data_str(r#"{"Course Code": "CS301", "Semester": 5}"#).unwrap();
        assert_eq!(form.get_str("Course Code"), Some("CS301"));
        assert!(parse_form_data_str("[1, 2]").is_err());
        assert!(matches!(
            parse_form_data_str("{oops"),
            Err(ConfigError::InvalidFormData(_))
        ));
    }

    #[test]
    fn first_number_extraction() {
        assert_eq!(first_number("CO12"), Some(12));
        assert_eq!(first_number("Module 3 - Graphs"), Some(3));
        assert_eq!(first_number("Lab"), None);
    }

    #[test]
    fn validate_flags_weight_sum_and_targets() {
        let design = parse_sequence_str(
            r#"[
                {"name": "CO1", "type": "CO", "weight": 70, "blooms": "apply"},
                {"name": "CO2", "type": "CO", "weight": 40, "blooms": "synthesis"},
                {"name": "CO3", "type": "CO", "weight": 0},
                {"name": "M1", "type": "Module", "hours": 0}
            ]"#,
        )
        .unwrap();
        let warnings = validate_course_design(&design);
        assert!(warnings.iter().any(|w| w.message.contains("sum to 110.0%")));
        assert!(warnings.iter().any(|w| w.message.contains("'synthesis'")));
        assert!(warnings
            .iter()
            .any(|w| w.key.as_deref() == Some("CO3") && w.message.contains("no target")));
        assert!(warnings
            .iter()
            .any(|w| w.key.as_deref() == Some("M1") && w.message.contains("hours are zero")));
    }

    #[test]
    fn validate_clean_design() {
        let design = parse_sequence_str(SEQUENCE).unwrap();
        assert!(validate_course_design(&design).is_empty());
    }

    #[test]
    fn load_sequence_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequence.json");
        std::fs::write(&path, SEQUENCE).unwrap();
        let design = load_sequence(&path).unwrap();
        assert_eq!(design.outcomes.len(), 2);
        assert!(load_sequence(&dir.path().join("missing.json")).is_err());
    }
}
