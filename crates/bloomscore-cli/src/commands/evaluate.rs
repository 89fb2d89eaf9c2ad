//! The `bloomscore evaluate` command.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use bloomscore_core::config::load_config_from;
use bloomscore_core::engine::ProgressReporter;
use bloomscore_core::report::PaperReport;
use bloomscore_core::sequence::{load_form_data, load_sequence, validate_course_design, FormData};
use bloomscore_core::{EvaluationResult, Evaluator};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_paper_start(&self, path: &Path) {
        eprintln!("  Evaluating: {}", path.display());
    }

    fn on_paper_complete(&self, path: &Path, result: &EvaluationResult) {
        eprintln!(
            "  Done: {} ({} questions, FinalScore {:.1})",
            path.display(),
            result.question_count(),
            result.final_score
        );
    }

    fn on_paper_error(&self, path: &Path, error: &str) {
        eprintln!("  ERROR: {}: {error}", path.display());
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    sequence_path: PathBuf,
    form_path: Option<PathBuf>,
    questions: Vec<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (write_json, show_table) = match format.as_str() {
        "json" => (true, false),
        "table" => (false, true),
        "all" => (true, true),
        other => anyhow::bail!("unknown format '{other}', expected json, table or all"),
    };

    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let design = load_sequence(&sequence_path)?;
    for w in validate_course_design(&design) {
        match &w.key {
            Some(key) => tracing::warn!("{key}: {}", w.message),
            None => tracing::warn!("{}", w.message),
        }
    }
    let form = match &form_path {
        Some(path) => load_form_data(path)?,
        None => FormData::default(),
    };

    let evaluator = Evaluator::from_config(&config)?;
    let design = Arc::new(design);
    let total = questions.len();

    eprintln!(
        "bloomscore v{}: evaluating {} paper(s) against {} CO(s) and {} module(s)",
        env!("CARGO_PKG_VERSION"),
        total,
        design.outcomes.len(),
        design.modules.len()
    );
    eprintln!();

    let outcomes = evaluator
        .evaluate_batch(Arc::clone(&design), questions, parallelism, &ConsoleReporter)
        .await;

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let mut reports = Vec::new();
    let mut written = HashSet::new();
    let mut failed = 0usize;

    for outcome in outcomes {
        let evaluation = match outcome.result {
            Ok(evaluation) => evaluation,
            Err(_) => {
                failed += 1;
                continue;
            }
        };
        let stem = outcome
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "paper".to_string());
        let report = PaperReport::new(form.clone(), &design, evaluation)
            .with_source(outcome.path.display().to_string());

        if write_json {
            let path = report_path(&output, &format!("report-{stem}-{timestamp}"), &mut written);
            report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        reports.push((stem, report));
    }

    if show_table && !reports.is_empty() {
        print_summary(&reports);
        for (stem, report) in &reports {
            print_recommendations(stem, &report.data);
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} paper(s) failed to evaluate");
    }

    Ok(())
}

/// `<output>/<base>.json`, or `<base>-2.json`, `<base>-3.json`, ... when a
/// sheet with the same stem was already written or the file exists.
fn report_path(output: &Path, base: &str, written: &mut HashSet<PathBuf>) -> PathBuf {
    let mut n = 1usize;
    loop {
        let name = if n == 1 {
            format!("{base}.json")
        } else {
            format!("{base}-{n}.json")
        };
        let path = output.join(name);
        if !written.contains(&path) && !path.exists() {
            written.insert(path.clone());
            return path;
        }
        n += 1;
    }
}

fn print_summary(reports: &[(String, PaperReport)]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Paper",
        "Questions",
        "Unclassified",
        "Match %",
        "Variance",
        "FinalScore",
        "Band",
    ]);

    for (stem, report) in reports {
        let data = &report.data;
        table.add_row(vec![
            Cell::new(stem),
            Cell::new(data.question_count()),
            Cell::new(data.unclassified_count()),
            Cell::new(format!("{:.1}%", data.components.match_ratio * 100.0)),
            Cell::new(format!("{:.1}", data.components.aggregate_variance)),
            Cell::new(format!("{:.1}", data.final_score)),
            Cell::new(data.band()),
        ]);
    }

    println!("\n{table}");
}

fn print_recommendations(stem: &str, data: &EvaluationResult) {
    if data.recommendation_count() == 0 {
        println!("\n{stem}: no recommendations.");
        return;
    }

    println!("\n{stem}: {}", data.band().description());
    for r in &data.co_recommendations {
        println!(
            "  [{}] {:.1}% expected, {:.1}% actual. {}",
            r.co, r.expected, r.actual, r.suggestion
        );
    }
    for r in &data.module_recommendations {
        println!(
            "  [{}] {:.1}% expected, {:.1}% actual. {}",
            r.module, r.expected, r.actual, r.suggestion
        );
    }
    for r in &data.question_recommendations {
        println!("  [{}] \"{}\": {}", r.co, r.question, r.suggestion);
    }
}
