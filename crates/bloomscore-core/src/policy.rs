//! Final score policy.
//!
//! The final score combines two independently computed components: how
//! many questions sit at their CO's target level, and how closely the marks
//! distribution follows the declared design. The combination is a
//! [`ScorePolicy`] so it can be swapped without touching the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inputs to the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    /// Fraction (0–1) of scored questions matching their target level.
    pub match_ratio: f64,
    /// Aggregate distribution variance (0–100), lower is better.
    pub aggregate_variance: f64,
}

/// Turns score components into a 0–100 final score.
pub trait ScorePolicy: Send + Sync + fmt::Debug {
    /// Short policy name, recorded for transparency.
    fn name(&self) -> &str;

    /// Combine the components. Implementations should be non-decreasing in
    /// `match_ratio`; callers clamp the result to 0–100.
    fn combine(&self, components: &ScoreComponents) -> f64;

    /// The clamped final score.
    fn final_score(&self, components: &ScoreComponents) -> f64 {
        let score = self.combine(components);
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        }
    }
}

/// Weighted mean of alignment (`match_ratio × 100`) and balance
/// (`100 − aggregate_variance`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedScorePolicy {
    #[serde(default = "default_alignment_weight")]
    pub alignment_weight: f64,
    #[serde(default = "default_balance_weight")]
    pub balance_weight: f64,
}

fn default_alignment_weight() -> f64 {
    0.6
}

fn default_balance_weight() -> f64 {
    0.4
}

impl Default for WeightedScorePolicy {
    fn default() -> Self {
        Self {
            alignment_weight: default_alignment_weight(),
            balance_weight: default_balance_weight(),
        }
    }
}

impl WeightedScorePolicy {
    /// Negative weights are treated as zero.
    pub fn new(alignment_weight: f64, balance_weight: f64) -> Self {
        Self {
            alignment_weight: alignment_weight.max(0.0),
            balance_weight: balance_weight.max(0.0),
        }
    }
}

impl ScorePolicy for WeightedScorePolicy {
    fn name(&self) -> &str {
        "weighted"
    }

    fn combine(&self, c: &ScoreComponents) -> f64 {
        let wa = self.alignment_weight.max(0.0);
        let wb = self.balance_weight.max(0.0);
        let total = wa + wb;
        if total <= 0.0 {
            return 0.0;
        }
        let alignment = c.match_ratio.clamp(0.0, 1.0) * 100.0;
        let balance = (100.0 - c.aggregate_variance).clamp(0.0, 100.0);
        (wa * alignment + wb * balance) / total
    }
}

/// Qualitative band for a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Excellent
        } else if score >= 60.0 {
            ScoreBand::Good
        } else if score >= 40.0 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Moderate => "Moderate",
            ScoreBand::Poor => "Poor",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ScoreBand::Excellent => {
                "Strong alignment and balanced distribution. Minor refinements may enhance quality further."
            }
            ScoreBand::Good => {
                "Reasonable alignment with some areas needing attention. Review under-represented modules/COs."
            }
            ScoreBand::Moderate => {
                "Significant improvements needed. Revise question cognitive levels and balance distribution."
            }
            ScoreBand::Poor => {
                "Comprehensive restructuring required. Major misalignment in cognitive levels and/or distribution."
            }
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(match_ratio: f64, aggregate_variance: f64) -> ScoreComponents {
        ScoreComponents {
            match_ratio,
            aggregate_variance,
        }
    }

    #[test]
    fn perfect_paper_scores_100() {
        let policy = WeightedScorePolicy::default();
        assert!((policy.final_score(&components(1.0, 0.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn worst_paper_scores_0() {
        let policy = WeightedScorePolicy::default();
        assert_eq!(policy.final_score(&components(0.0, 100.0)), 0.0);
    }

    #[test]
    fn default_weighting() {
        let policy = WeightedScorePolicy::default();
        // 0.6 * 50 + 0.4 * 80
        assert!((policy.final_score(&components(0.5, 20.0)) - 62.0).abs() < 1e-9);
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let a = WeightedScorePolicy::new(3.0, 2.0);
        let b = WeightedScorePolicy::default();
        let c = components(0.25, 40.0);
        assert!((a.final_score(&c) - b.final_score(&c)).abs() < 1e-9);
    }

    #[test]
    fn zero_weights_score_zero() {
        let policy = WeightedScorePolicy::new(-1.0, 0.0);
        assert_eq!(policy.final_score(&components(1.0, 0.0)), 0.0);
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let policy = WeightedScorePolicy::default();
        let score = policy.final_score(&components(3.0, -50.0));
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn bands() {
        assert_eq!(ScoreBand::from_score(80.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79.9), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(40.0), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::Poor);
        assert_eq!(ScoreBand::Good.to_string(), "Good");
    }
}
