//! Per-question alignment and distribution statistics.
//!
//! Every function here is a pure function of the classified questions and
//! the course design. Percentages are on a 0–100 scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BloomLevel, CourseDesign, Question, Remark};
use crate::normalizer::BloomLevelMap;

/// `part` as a percentage of `total`; 0 when `total` is not positive.
pub fn percent(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Sum of marks over all questions, classified or not.
pub fn total_marks(questions: &[Question]) -> f64 {
    questions.iter().map(|q| q.marks).sum()
}

/// Set each question's remark by comparing its extracted level with the
/// target of its CO.
///
/// Questions that are unclassified, tagged with an undeclared CO, or whose
/// CO has no recognized target keep `remark = None`.
pub fn score_questions(questions: Vec<Question>, design: &CourseDesign) -> Vec<Question> {
    questions
        .into_iter()
        .map(|mut q| {
            let target = design.outcome(&q.co).and_then(|co| co.target());
            q.remark = match (q.level, target) {
                (Some(extracted), Some(target)) => Some(Remark::compare(extracted, target)),
                _ => None,
            };
            q
        })
        .collect()
}

/// Counts of matches/higher/lower across a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    pub matches: usize,
    pub higher: usize,
    pub lower: usize,
    /// Questions without a qScore.
    pub unscored: usize,
    pub total: usize,
}

impl AlignmentSummary {
    /// Fraction (0–1) of scored questions whose level matches the target.
    pub fn match_ratio(&self) -> f64 {
        let scored = self.matches + self.higher + self.lower;
        if scored == 0 {
            0.0
        } else {
            self.matches as f64 / scored as f64
        }
    }
}

pub fn summarize_alignment(questions: &[Question]) -> AlignmentSummary {
    let mut summary = AlignmentSummary {
        total: questions.len(),
        ..Default::default()
    };
    for q in questions {
        match q.remark {
            Some(Remark::Matches) => summary.matches += 1,
            Some(Remark::Higher) => summary.higher += 1,
            Some(Remark::Lower) => summary.lower += 1,
            None => summary.unscored += 1,
        }
    }
    summary
}

/// Expected vs actual share of one Bloom's level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomLevelStats {
    /// Level name.
    pub name: String,
    /// Ordinal under the course's level map.
    pub level: u8,
    /// Percent of CO weight targeting this level.
    pub weights: f64,
    /// Percent of total marks on questions extracted at this level.
    pub marks: f64,
    #[serde(rename = "No_Of_Questions")]
    pub questions: usize,
}

impl BloomLevelStats {
    pub fn variance(&self) -> f64 {
        self.marks - self.weights
    }
}

/// Per-level distribution, keyed by ordinal.
///
/// `weights` is relative to the weight of COs whose target is a canonical
/// level, so the six values sum to 100 whenever that weight is positive.
pub fn bloom_distribution(
    questions: &[Question],
    design: &CourseDesign,
    map: &BloomLevelMap,
) -> BTreeMap<u8, BloomLevelStats> {
    let mut weight_by_level = [0.0f64; 6];
    for co in &design.outcomes {
        if let Some(target) = co.target() {
            weight_by_level[target.canonical_index()] += co.weight;
        }
    }
    let targeted_weight: f64 = weight_by_level.iter().sum();

    let mut marks_by_level = [0.0f64; 6];
    let mut count_by_level = [0usize; 6];
    for q in questions {
        if let Some(level) = q.level {
            marks_by_level[level.canonical_index()] += q.marks;
            count_by_level[level.canonical_index()] += 1;
        }
    }
    let all_marks = total_marks(questions);

    BloomLevel::CANONICAL
        .into_iter()
        .map(|level| {
            let idx = level.canonical_index();
            let ordinal = map.ordinal(level);
            (
                ordinal,
                BloomLevelStats {
                    name: level.name().to_string(),
                    level: ordinal,
                    weights: percent(weight_by_level[idx], targeted_weight),
                    marks: percent(marks_by_level[idx], all_marks),
                    questions: count_by_level[idx],
                },
            )
        })
        .collect()
}

/// Expected vs actual share of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCoverage {
    pub module: String,
    /// Percent of total teaching hours.
    pub expected: f64,
    /// Percent of total marks.
    pub actual: f64,
}

impl ModuleCoverage {
    pub fn variance(&self) -> f64 {
        self.actual - self.expected
    }
}

/// Per-module distribution, in declaration order.
pub fn module_distribution(questions: &[Question], design: &CourseDesign) -> Vec<ModuleCoverage> {
    let total_hours = design.total_hours();
    let all_marks = total_marks(questions);

    design
        .modules
        .iter()
        .map(|module| {
            let marks: f64 = questions
                .iter()
                .filter(|q| module.matches_tag(&q.module))
                .map(|q| q.marks)
                .sum();
            ModuleCoverage {
                module: module.key.clone(),
                expected: percent(module.hours, total_hours),
                actual: percent(marks, all_marks),
            }
        })
        .collect()
}

/// Expected vs actual share of one course outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct CoCoverage {
    pub key: String,
    pub number: u32,
    /// Percent of total declared CO weight.
    pub expected: f64,
    /// Percent of total marks on questions tagged with this CO.
    pub actual: f64,
}

impl CoCoverage {
    pub fn variance(&self) -> f64 {
        self.actual - self.expected
    }
}

/// Per-CO coverage, in declaration order. Coverage counts marks regardless
/// of whether the questions are at the right level.
pub fn co_coverage(questions: &[Question], design: &CourseDesign) -> Vec<CoCoverage> {
    let total_weight = design.total_weight();
    let all_marks = total_marks(questions);

    design
        .outcomes
        .iter()
        .map(|co| {
            let marks: f64 = questions
                .iter()
                .filter(|q| q.co.eq_ignore_ascii_case(&co.key))
                .map(|q| q.marks)
                .sum();
            CoCoverage {
                key: co.key.clone(),
                number: co.number,
                expected: percent(co.weight, total_weight),
                actual: percent(marks, all_marks),
            }
        })
        .collect()
}

/// Half the sum of absolute differences between two percentage
/// distributions: 0 when identical, 100 when disjoint.
fn distance<I: IntoIterator<Item = f64>>(differences: I) -> f64 {
    (differences.into_iter().map(f64::abs).sum::<f64>() / 2.0).clamp(0.0, 100.0)
}

/// How far the marks distribution is from the declared design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionVariance {
    /// Distance between Bloom's level marks and weights (0–100).
    pub bloom_levels: f64,
    /// Distance between module marks and hours (0–100), 0 with no modules.
    pub modules: f64,
    /// Mean of the dimensions that apply (0–100).
    pub aggregate: f64,
}

/// Percent of total marks on questions with no extracted level.
pub fn unclassified_share(questions: &[Question]) -> f64 {
    let marks: f64 = questions
        .iter()
        .filter(|q| q.is_unclassified())
        .map(|q| q.marks)
        .sum();
    percent(marks, total_marks(questions))
}

/// Unclassified marks count as a seventh Bloom's bucket whose expected share
/// is 0, so a paper with no verifiable level is as far from the design as
/// one sitting entirely at the wrong level.
pub fn distribution_variance(
    blooms: &BTreeMap<u8, BloomLevelStats>,
    unclassified: f64,
    modules: &[ModuleCoverage],
) -> DistributionVariance {
    let bloom_levels = distance(
        blooms
            .values()
            .map(BloomLevelStats::variance)
            .chain(std::iter::once(unclassified)),
    );
    if modules.is_empty() {
        return DistributionVariance {
            bloom_levels,
            modules: 0.0,
            aggregate: bloom_levels,
        };
    }
    let modules = distance(modules.iter().map(ModuleCoverage::variance));
    DistributionVariance {
        bloom_levels,
        modules,
        aggregate: (bloom_levels + modules) / 2.0,
    }
}
