//! Recommendation synthesis.
//!
//! Turns misaligned questions and over/under-represented COs and modules
//! into directives. Output order follows the source order of questions,
//! outcomes and modules.

use serde::{Deserialize, Serialize};

use crate::model::{CourseDesign, Question, Remark};
use crate::scoring::{CoCoverage, ModuleCoverage};

/// Variance thresholds, in percentage points, above which a CO or module
/// gets a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPolicy {
    #[serde(default = "default_threshold")]
    pub co_threshold: f64,
    #[serde(default = "default_threshold")]
    pub module_threshold: f64,
}

fn default_threshold() -> f64 {
    5.0
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            co_threshold: default_threshold(),
            module_threshold: default_threshold(),
        }
    }
}

/// A question whose level differs from its CO target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecommendation {
    #[serde(rename = "QuestionData")]
    pub question: String,
    pub marks: f64,
    pub co: String,
    /// Every lexicon verb found, comma separated.
    #[serde(rename = "extractedVerb")]
    pub extracted_verb: String,
    #[serde(rename = "highestVerb")]
    pub highest_verb: Option<String>,
    #[serde(rename = "qScore")]
    pub q_score: u8,
    pub remark: String,
    #[serde(rename = "extractedLevel")]
    pub extracted_level: String,
    #[serde(rename = "expectedLevel")]
    pub expected_level: String,
    pub suggestion: String,
}

/// A CO whose share of marks is off its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoRecommendation {
    pub co: String,
    pub expected: f64,
    pub actual: f64,
    pub variance: f64,
    pub suggestion: String,
}

/// A module whose share of marks is off its share of hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecommendation {
    pub module: String,
    pub expected: f64,
    pub actual: f64,
    pub variance: f64,
    pub suggestion: String,
}

/// One entry per question scored higher or lower than its target.
pub fn question_recommendations(
    questions: &[Question],
    design: &CourseDesign,
) -> Vec<QuestionRecommendation> {
    questions
        .iter()
        .filter_map(|q| {
            let remark = q.remark.filter(|r| *r != Remark::Matches)?;
            let extracted = q.level?;
            let target = design.outcome(&q.co)?.target()?;
            let current = q
                .highest_verb
                .as_deref()
                .map(|v| format!(" instead of '{v}'"))
                .unwrap_or_default();
            let direction = match remark {
                Remark::Higher => "Lower",
                _ => "Raise",
            };
            let suggestion = format!(
                "{direction} the cognitive demand to the '{target}' level, e.g. rephrase with '{}'{current}.",
                target.example_verb()
            );
            Some(QuestionRecommendation {
                question: q.text.clone(),
                marks: q.marks,
                co: q.co.clone(),
                extracted_verb: q.verbs.join(", "),
                highest_verb: q.highest_verb.clone(),
                q_score: remark.q_score(),
                remark: remark.text().to_string(),
                extracted_level: extracted.name().to_string(),
                expected_level: target.name().to_string(),
                suggestion,
            })
        })
        .collect()
}

/// One entry per CO whose |actual − expected| exceeds the threshold.
pub fn co_recommendations(
    coverage: &[CoCoverage],
    policy: &RecommendationPolicy,
) -> Vec<CoRecommendation> {
    coverage
        .iter()
        .filter(|c| c.variance().abs() > policy.co_threshold)
        .map(|c| {
            let variance = c.variance();
            let suggestion = if variance < 0.0 {
                format!(
                    "Increase representation of {}: add questions worth about {:.1}% more of the total marks.",
                    c.key,
                    -variance
                )
            } else {
                format!(
                    "Reduce emphasis on {}: it carries about {:.1}% more of the total marks than its weight.",
                    c.key, variance
                )
            };
            CoRecommendation {
                co: c.key.clone(),
                expected: c.expected,
                actual: c.actual,
                variance,
                suggestion,
            }
        })
        .collect()
}

/// One entry per module whose |actual − expected| exceeds the threshold.
pub fn module_recommendations(
    coverage: &[ModuleCoverage],
    policy: &RecommendationPolicy,
) -> Vec<ModuleRecommendation> {
    coverage
        .iter()
        .filter(|m| m.variance().abs() > policy.module_threshold)
        .map(|m| {
            let variance = m.variance();
            let suggestion = if variance < 0.0 {
                format!(
                    "Increase coverage of {}: add questions worth about {:.1}% more of the total marks to match its teaching hours.",
                    m.module,
                    -variance
                )
            } else {
                format!(
                    "Reduce coverage of {}: it carries about {:.1}% more of the total marks than its teaching hours suggest.",
                    m.module, variance
                )
            };
            ModuleRecommendation {
                module: m.module.clone(),
                expected: m.expected,
                actual: m.actual,
                variance,
                suggestion,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BloomLevel, CourseOutcome};
    use crate::scoring::score_questions;
    use std::collections::BTreeMap;

    fn design() -> CourseDesign {
        CourseDesign {
            outcomes: vec![CourseOutcome {
                key: "CO1".into(),
                number: 1,
                weight: 100.0,
                blooms: vec!["apply".into()],
            }],
            modules: vec![],
            duplicate_keys: vec![],
        }
    }

    fn question(text: &str, verb: &str, level: BloomLevel) -> Question {
        Question {
            text: text.into(),
            marks: 4.0,
            co: "CO1".into(),
            module: "M1".into(),
            question_type: String::new(),
            verbs: vec![verb.into()],
            highest_verb: Some(verb.into()),
            level: Some(level),
            remark: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn only_misaligned_questions_are_recommended() {
        let d = design();
        let questions = score_questions(
            vec![
                question("Solve x", "solve", BloomLevel::Apply),
                question("Design y", "design", BloomLevel::Create),
                question("Define z", "define", BloomLevel::Remember),
            ],
            &d,
        );
        let recs = question_recommendations(&questions, &d);
        assert_eq!(recs.len(), 2);

        assert_eq!(recs[0].question, "Design y");
        assert_eq!(recs[0].q_score, 2);
        assert_eq!(recs[0].remark, "Higher than Expected Blooms Level");
        assert_eq!(recs[0].extracted_level, "create");
        assert_eq!(recs[0].expected_level, "apply");
        assert!(recs[0].suggestion.starts_with("Lower"));
        assert!(recs[0].suggestion.contains("'solve'"));

        assert_eq!(recs[1].question, "Define z");
        assert_eq!(recs[1].q_score, 3);
        assert!(recs[1].suggestion.starts_with("Raise"));
    }

    fn co(key: &str, expected: f64, actual: f64) -> CoCoverage {
        CoCoverage {
            key: key.into(),
            number: 0,
            expected,
            actual,
        }
    }

    #[test]
    fn co_recommendations_respect_threshold() {
        let coverage = vec![co("CO1", 60.0, 40.0), co("CO2", 40.0, 44.0), co("CO3", 0.0, 16.0)];
        let recs = co_recommendations(&coverage, &RecommendationPolicy::default());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].co, "CO1");
        assert!((recs[0].variance + 20.0).abs() < 1e-9);
        assert!(recs[0].suggestion.starts_with("Increase representation of CO1"));
        assert_eq!(recs[1].co, "CO3");
        assert!(recs[1].suggestion.starts_with("Reduce emphasis on CO3"));
    }

    #[test]
    fn variance_equal_to_threshold_is_not_reported() {
        let policy = RecommendationPolicy {
            co_threshold: 10.0,
            module_threshold: 10.0,
        };
        assert!(co_recommendations(&[co("CO1", 50.0, 60.0)], &policy).is_empty());
    }

    #[test]
    fn module_recommendations_in_source_order() {
        let coverage = vec![
            ModuleCoverage {
                module: "M2".into(),
                expected: 50.0,
                actual: 20.0,
            },
            ModuleCoverage {
                module: "M1".into(),
                expected: 50.0,
                actual: 80.0,
            },
        ];
        let recs = module_recommendations(&coverage, &RecommendationPolicy::default());
        let modules: Vec<&str> = recs.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(modules, vec!["M2", "M1"]);
        assert!(recs[0].suggestion.starts_with("Increase coverage of M2"));
        assert!(recs[1].suggestion.starts_with("Reduce coverage of M1"));
    }
}
