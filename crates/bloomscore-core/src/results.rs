//! The evaluation result, in the field layout consumers read.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::Question;
use crate::normalizer::BloomLevelMap;
use crate::policy::{ScoreBand, ScoreComponents};
use crate::recommend::{CoRecommendation, ModuleRecommendation, QuestionRecommendation};
use crate::scoring::{AlignmentSummary, BloomLevelStats, DistributionVariance, ModuleCoverage};

/// One classified question as it appears in `QuestionData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Marks")]
    pub marks: f64,
    #[serde(rename = "CO")]
    pub co: String,
    #[serde(rename = "Module")]
    pub module: String,
    #[serde(rename = "QT")]
    pub question_type: String,
    #[serde(rename = "Bloom's Verbs")]
    pub verbs: Vec<String>,
    /// Ordinal of the extracted level under the course's level map.
    #[serde(rename = "Bloom's Taxonomy Level")]
    pub level: Option<u8>,
    #[serde(rename = "Bloom's Highest Verb")]
    pub highest_verb: Option<String>,
    #[serde(rename = "Remark")]
    pub remark: Option<String>,
    #[serde(rename = "qScore")]
    pub q_score: Option<u8>,
    /// Pass-through spreadsheet columns.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

const RESERVED_COLUMNS: &[&str] = &[
    "Question",
    "Marks",
    "CO",
    "Module",
    "QT",
    "Bloom's Verbs",
    "Bloom's Taxonomy Level",
    "Bloom's Highest Verb",
    "Remark",
    "qScore",
];

impl QuestionRow {
    pub fn new(question: &Question, map: &BloomLevelMap) -> Self {
        let extra = question
            .extra
            .iter()
            .filter(|(name, _)| !RESERVED_COLUMNS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            question: question.text.clone(),
            marks: question.marks,
            co: question.co.clone(),
            module: question.module.clone(),
            question_type: question.question_type.clone(),
            verbs: question.verbs.clone(),
            level: question.level.map(|l| map.ordinal(l)),
            highest_verb: question.highest_verb.clone(),
            remark: question.remark.map(|r| r.text().to_string()),
            q_score: question.q_score(),
            extra,
        }
    }
}

/// Everything one evaluation run produces.
///
/// Contains only ordered collections so that identical input serializes to
/// identical JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(rename = "QuestionData")]
    pub questions: Vec<QuestionRow>,
    /// Per-level statistics keyed by ordinal.
    #[serde(rename = "BloomsData", deserialize_with = "numeric_keys")]
    pub blooms: BTreeMap<u8, BloomLevelStats>,
    #[serde(rename = "ModuleData")]
    pub modules: Vec<ModuleCoverage>,
    /// Percent of total marks per CO number.
    #[serde(rename = "COData", deserialize_with = "numeric_keys")]
    pub co_coverage: BTreeMap<u32, f64>,
    #[serde(rename = "FinalScore")]
    pub final_score: f64,
    #[serde(rename = "ScoreComponents")]
    pub components: ScoreComponents,
    #[serde(rename = "DistributionVariance")]
    pub variance: DistributionVariance,
    #[serde(rename = "AlignmentSummary")]
    pub alignment: AlignmentSummary,
    #[serde(rename = "QuestionRecommendations")]
    pub question_recommendations: Vec<QuestionRecommendation>,
    #[serde(rename = "CORecommendations")]
    pub co_recommendations: Vec<CoRecommendation>,
    #[serde(rename = "ModuleRecommendations")]
    pub module_recommendations: Vec<ModuleRecommendation>,
}

/// Integer-keyed map, read through string keys. Inside a flattened
/// report the map arrives as buffered content, which only yields strings.
fn numeric_keys<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: std::str::FromStr + Ord,
    K::Err: std::fmt::Display,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse()
                .map(|key| (key, value))
                .map_err(|e| serde::de::Error::custom(format!("invalid key '{key}': {e}")))
        })
        .collect()
}

impl EvaluationResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.final_score)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Questions in which no lexicon verb was found.
    pub fn unclassified_count(&self) -> usize {
        self.questions.iter().filter(|q| q.level.is_none()).count()
    }

    pub fn total_marks(&self) -> f64 {
        self.questions.iter().map(|q| q.marks).sum()
    }

    pub fn recommendation_count(&self) -> usize {
        self.question_recommendations.len()
            + self.co_recommendations.len()
            + self.module_recommendations.len()
    }
}
