//! Evaluation pipeline orchestrator.
//!
//! Runs classify → normalize → aggregate → recommend for one paper, and
//! fans several papers out over a bounded pool of blocking tasks.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::config::BloomscoreConfig;
use crate::error::{ConfigError, IngestError};
use crate::ingest::{load_questions, read_questions};
use crate::lexicon::Lexicon;
use crate::model::{CourseDesign, Question};
use crate::normalizer::BloomLevelMap;
use crate::policy::{ScoreComponents, ScorePolicy, WeightedScorePolicy};
use crate::recommend::{
    co_recommendations, module_recommendations, question_recommendations, RecommendationPolicy,
};
use crate::results::{EvaluationResult, QuestionRow};
use crate::scoring::{
    bloom_distribution, co_coverage, distribution_variance, module_distribution,
    score_questions, summarize_alignment, unclassified_share,
};

/// The output of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Level map the ordinals in `result` refer to.
    pub level_map: BloomLevelMap,
    pub result: EvaluationResult,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_paper_start(&self, path: &Path);
    fn on_paper_complete(&self, path: &Path, result: &EvaluationResult);
    fn on_paper_error(&self, path: &Path, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_paper_start(&self, _: &Path) {}
    fn on_paper_complete(&self, _: &Path, _: &EvaluationResult) {}
    fn on_paper_error(&self, _: &Path, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Result of evaluating one paper in a batch.
#[derive(Debug)]
pub struct PaperOutcome {
    pub path: PathBuf,
    pub result: Result<Evaluation>,
}

/// Scores question papers against a course design.
///
/// Cheap to clone; the lexicon and score policy are shared read-only.
#[derive(Debug, Clone)]
pub struct Evaluator {
    lexicon: Arc<Lexicon>,
    policy: Arc<dyn ScorePolicy>,
    recommendations: RecommendationPolicy,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(
            Arc::new(Lexicon::builtin().clone()),
            Arc::new(WeightedScorePolicy::default()),
            RecommendationPolicy::default(),
        )
    }
}

impl Evaluator {
    pub fn new(
        lexicon: Arc<Lexicon>,
        policy: Arc<dyn ScorePolicy>,
        recommendations: RecommendationPolicy,
    ) -> Self {
        Self {
            lexicon,
            policy,
            recommendations,
        }
    }

    /// Build an evaluator from configuration, merging lexicon overrides
    /// over the built-in verbs.
    pub fn from_config(config: &BloomscoreConfig) -> Result<Self, ConfigError> {
        let lexicon = if config.lexicon.verbs.is_empty() {
            Lexicon::builtin().clone()
        } else {
            Lexicon::builtin().with_overrides(&config.lexicon.verbs)?
        };
        let score = WeightedScorePolicy::new(
            config.score.alignment_weight,
            config.score.balance_weight,
        );
        Ok(Self::new(
            Arc::new(lexicon),
            Arc::new(score),
            config.recommendations,
        ))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn policy(&self) -> &dyn ScorePolicy {
        self.policy.as_ref()
    }

    pub fn recommendations(&self) -> &RecommendationPolicy {
        &self.recommendations
    }

    /// Score already-classified questions against `design`.
    ///
    /// Never fails: empty questions, outcomes or modules give a
    /// well-formed result with a final score of 0.
    pub fn evaluate(&self, design: &CourseDesign, questions: Vec<Question>) -> Evaluation {
        let level_map = BloomLevelMap::for_design(design);
        let questions = score_questions(questions, design);

        let alignment = summarize_alignment(&questions);
        let blooms = bloom_distribution(&questions, design, &level_map);
        let modules = module_distribution(&questions, design);
        let cos = co_coverage(&questions, design);
        let variance = distribution_variance(&blooms, unclassified_share(&questions), &modules);
        tracing::debug!(
            questions = alignment.total,
            matches = alignment.matches,
            higher = alignment.higher,
            lower = alignment.lower,
            unscored = alignment.unscored,
            "scored questions"
        );

        let components = ScoreComponents {
            match_ratio: alignment.match_ratio(),
            aggregate_variance: variance.aggregate,
        };
        let final_score = if questions.is_empty()
            || design.outcomes.is_empty()
            || design.modules.is_empty()
        {
            tracing::debug!("degenerate input, final score is 0");
            0.0
        } else {
            self.policy.final_score(&components)
        };

        let result = EvaluationResult {
            questions: questions
                .iter()
                .map(|q| QuestionRow::new(q, &level_map))
                .collect(),
            blooms,
            co_coverage: cos.iter().map(|c| (c.number, c.actual)).collect(),
            final_score,
            components,
            variance,
            alignment,
            question_recommendations: question_recommendations(&questions, design),
            co_recommendations: co_recommendations(&cos, &self.recommendations),
            module_recommendations: module_recommendations(&modules, &self.recommendations),
            modules,
        };

        tracing::info!(
            questions = result.question_count(),
            unclassified = result.unclassified_count(),
            final_score = result.final_score,
            policy = self.policy.name(),
            "evaluation complete"
        );

        Evaluation { level_map, result }
    }

    /// Read question rows from a CSV source and evaluate them.
    pub fn evaluate_rows<R: Read>(
        &self,
        design: &CourseDesign,
        reader: R,
    ) -> Result<Evaluation, IngestError> {
        let questions = read_questions(reader, &self.lexicon)?;
        Ok(self.evaluate(design, questions))
    }

    /// Read a question sheet from disk and evaluate it.
    pub fn evaluate_file(&self, design: &CourseDesign, path: &Path) -> Result<Evaluation> {
        let questions = load_questions(path, &self.lexicon)?;
        Ok(self.evaluate(design, questions))
    }

    /// Evaluate several question sheets against one design.
    ///
    /// At most `parallelism` sheets are processed at a time. Outcomes are
    /// returned in the order of `papers`; one failing sheet does not affect
    /// the others.
    pub async fn evaluate_batch(
        &self,
        design: Arc<CourseDesign>,
        papers: Vec<PathBuf>,
        parallelism: usize,
        progress: &dyn ProgressReporter,
    ) -> Vec<PaperOutcome> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
        let total = papers.len();

        let mut futures = FuturesUnordered::new();
        for (idx, path) in papers.into_iter().enumerate() {
            let evaluator = self.clone();
            let design = Arc::clone(&design);
            let semaphore = Arc::clone(&semaphore);

            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_paper_start(&path);
                    let task_path = path.clone();
                    let evaluation = tokio::task::spawn_blocking(move || {
                        evaluator.evaluate_file(&design, &task_path)
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("evaluation task failed: {e}"))??;
                    Ok::<Evaluation, anyhow::Error>(evaluation)
                };
                let result = inner.await;
                (idx, PaperOutcome { path, result })
            });
        }

        let mut outcomes: Vec<Option<PaperOutcome>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        let mut failed = 0usize;

        while let Some((idx, outcome)) = futures.next().await {
            match &outcome.result {
                Ok(evaluation) => {
                    progress.on_paper_complete(&outcome.path, &evaluation.result);
                    completed += 1;
                }
                Err(e) => {
                    tracing::error!("evaluation failed for {}: {e:#}", outcome.path.display());
                    progress.on_paper_error(&outcome.path, &format!("{e:#}"));
                    failed += 1;
                }
            }
            outcomes[idx] = Some(outcome);
        }

        progress.on_batch_complete(total, completed, failed, start.elapsed());
        outcomes.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::parse_sequence_str;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SEQUENCE: &str = r#"[
        {"name": "CO1", "type": "CO", "weight": 60, "blooms": "apply"},
        {"name": "CO2", "type": "CO", "weight": 40, "blooms": ["analyze"]},
        {"name": "M1", "type": "Module", "hours": 10}
    ]"#;

    const SHEET: &str = "\
Question,Marks,CO,Module
Solve the recurrence,5,CO1,M1
Compare the two schedulers,5,CO2,M1
";

    fn design() -> CourseDesign {
        parse_sequence_str(SEQUENCE).unwrap()
    }

    #[test]
    fn evaluate_aligned_paper() {
        let evaluator = Evaluator::default();
        let evaluation = evaluator.evaluate_rows(&design(), SHEET.as_bytes()).unwrap();
        let result = &evaluation.result;

        assert_eq!(result.question_count(), 2);
        assert_eq!(result.alignment.matches, 2);
        assert!(result.question_recommendations.is_empty());
        assert_eq!(result.co_coverage.get(&1), Some(&50.0));
        assert_eq!(result.co_coverage.get(&2), Some(&50.0));
        // CO1 expects 60%, CO2 40%: both 10 points off.
        assert_eq!(result.co_recommendations.len(), 2);
        assert!(result.final_score > 0.0 && result.final_score <= 100.0);
        assert_eq!(result.components.match_ratio, 1.0);
    }

    #[test]
    fn empty_inputs_give_zero_score() {
        let evaluator = Evaluator::default();
        let evaluation = evaluator.evaluate(&design(), vec![]);
        assert_eq!(evaluation.result.final_score, 0.0);
        assert!(evaluation.result.questions.is_empty());

        let evaluation = evaluator
            .evaluate_rows(&CourseDesign::default(), SHEET.as_bytes())
            .unwrap();
        assert_eq!(evaluation.result.final_score, 0.0);
        assert!(evaluation.result.co_coverage.is_empty());
        assert!(evaluation.result.modules.is_empty());
    }

    #[test]
    fn config_lexicon_overrides_apply() {
        let mut config = BloomscoreConfig::default();
        config
            .lexicon
            .verbs
            .insert("sketch".into(), "create".into());
        let evaluator = Evaluator::from_config(&config).unwrap();
        assert_eq!(
            evaluator.lexicon().level_of("sketch"),
            Some(crate::model::BloomLevel::Create)
        );

        config.lexicon.verbs.insert("ponder".into(), "wonder".into());
        assert!(matches!(
            Evaluator::from_config(&config),
            Err(ConfigError::UnknownLevel { .. })
        ));
    }

    #[derive(Default)]
    struct CountingReporter {
        started: AtomicUsize,
        completed: AtomicUsize,
        failed: AtomicUsize,
    }

    impl ProgressReporter for CountingReporter {
        fn on_paper_start(&self, _: &Path) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_paper_complete(&self, _: &Path, _: &EvaluationResult) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_paper_error(&self, _: &Path, _: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    #[tokio::test]
    async fn batch_keeps_input_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut papers = Vec::new();
        for name in ["a.csv", "b.csv", "c.csv"] {
            let path = dir.path().join(name);
            std::fs::write(&path, SHEET).unwrap();
            papers.push(path);
        }
        papers.insert(1, dir.path().join("missing.csv"));

        let reporter = CountingReporter::default();
        let outcomes = Evaluator::default()
            .evaluate_batch(Arc::new(design()), papers.clone(), 2, &reporter)
            .await;

        let paths: Vec<&PathBuf> = outcomes.iter().map(|o| &o.path).collect();
        assert_eq!(paths, papers.iter().collect::<Vec<_>>());
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(outcomes[2].result.is_ok());
        assert_eq!(reporter.started.load(Ordering::SeqCst), 4);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 3);
        assert_eq!(reporter.failed.load(Ordering::SeqCst), 1);
    }
}
