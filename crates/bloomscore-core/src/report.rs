//! Paper report envelope with JSON persistence and comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Evaluation;
use crate::model::{CourseDesign, CourseOutcome, Module};
use crate::normalizer::BloomLevelMap;
use crate::results::EvaluationResult;
use crate::scoring::percent;
use crate::sequence::FormData;

const ENVELOPE_KEYS: &[&str] = &[
    "id",
    "created_at",
    "source",
    "Sequence",
    "bloomLevelMap",
    "Collected Data",
];

/// The declared design as stored alongside a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceSummary {
    #[serde(rename = "COs")]
    pub outcomes: Vec<CourseOutcome>,
    #[serde(rename = "ModuleHours")]
    pub modules: Vec<Module>,
}

impl From<&CourseDesign> for SequenceSummary {
    fn from(design: &CourseDesign) -> Self {
        Self {
            outcomes: design.outcomes.clone(),
            modules: design.modules.clone(),
        }
    }
}

/// A stored paper evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Question sheet the report was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Course metadata, passed through verbatim.
    #[serde(flatten)]
    pub form: FormData,
    #[serde(rename = "Sequence")]
    pub sequence: SequenceSummary,
    #[serde(rename = "bloomLevelMap")]
    pub level_map: BloomLevelMap,
    #[serde(rename = "Collected Data")]
    pub data: EvaluationResult,
}

impl PaperReport {
    pub fn new(form: FormData, design: &CourseDesign, evaluation: Evaluation) -> Self {
        let mut form = form;
        form.0.retain(|key, _| {
            let reserved = ENVELOPE_KEYS.contains(&key.as_str());
            if reserved {
                tracing::warn!("form field '{key}' collides with a report field, dropping it");
            }
            !reserved
        });
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: None,
            form,
            sequence: SequenceSummary::from(design),
            level_map: evaluation.level_map,
            data: evaluation.result,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: PaperReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Distance between actual and expected coverage per CO number, in
    /// percentage points.
    fn coverage_gaps(&self) -> BTreeMap<u32, f64> {
        let total_weight: f64 = self.sequence.outcomes.iter().map(|co| co.weight).sum();
        self.sequence
            .outcomes
            .iter()
            .map(|co| {
                let actual = self.data.co_coverage.get(&co.number).copied().unwrap_or(0.0);
                (co.number, (actual - percent(co.weight, total_weight)).abs())
            })
            .collect()
    }

    /// Compare this report against a baseline.
    ///
    /// The final score and match ratio regress when they drop by more than
    /// `threshold` points; a CO regresses when its coverage gap widens by
    /// more than `threshold` points.
    pub fn compare(&self, baseline: &PaperReport, threshold: f64) -> ComparisonReport {
        // (change, higher is better)
        let mut changes = vec![
            (
                Change::new("FinalScore", baseline.data.final_score, self.data.final_score),
                true,
            ),
            (
                Change::new(
                    "Match ratio",
                    baseline.data.components.match_ratio * 100.0,
                    self.data.components.match_ratio * 100.0,
                ),
                true,
            ),
        ];

        let baseline_gaps = baseline.coverage_gaps();
        let current_gaps = self.coverage_gaps();
        let mut new_cos = 0usize;
        for (number, &current) in &current_gaps {
            match baseline_gaps.get(number) {
                Some(&before) => changes.push((
                    Change::new(format!("CO{number} coverage gap"), before, current),
                    false,
                )),
                None => new_cos += 1,
            }
        }
        let removed_cos = baseline_gaps
            .keys()
            .filter(|k| !current_gaps.contains_key(k))
            .count();

        let mut report = ComparisonReport {
            baseline_score: baseline.data.final_score,
            current_score: self.data.final_score,
            new_cos,
            removed_cos,
            ..Default::default()
        };
        for (change, higher_is_better) in changes {
            let gain = if higher_is_better { change.delta } else { -change.delta };
            if gain < -threshold {
                report.regressions.push(change);
            } else if gain > threshold {
                report.improvements.push(change);
            } else {
                report.unchanged += 1;
            }
        }

        report
    }
}

/// One compared metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    pub delta: f64,
}

impl Change {
    fn new(metric: impl Into<String>, baseline: f64, current: f64) -> Self {
        Self {
            metric: metric.into(),
            baseline,
            current,
            delta: current - baseline,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub baseline_score: f64,
    pub current_score: f64,
    /// Metrics that got worse.
    pub regressions: Vec<Change>,
    /// Metrics that got better.
    pub improvements: Vec<Change>,
    /// Metrics with no significant change.
    pub unchanged: usize,
    /// COs in current but not baseline.
    pub new_cos: usize,
    /// COs in baseline but not current.
    pub removed_cos: usize,
}

impl ComparisonReport {
    pub fn score_delta(&self) -> f64 {
        self.current_score - self.baseline_score
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**FinalScore:** {:.1} -> {:.1} ({:+.1})\n\n",
            self.baseline_score,
            self.current_score,
            self.score_delta()
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Metric | Baseline | Current | Delta |\n");
            md.push_str("|--------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:+.1} |\n",
                    c.metric, c.baseline, c.current, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
