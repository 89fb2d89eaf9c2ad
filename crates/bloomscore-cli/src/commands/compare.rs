//! The `bloomscore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use bloomscore_core::report::PaperReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = PaperReport::load_json(&baseline_path)?;
    let current = PaperReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "FinalScore: {:.1} -> {:.1} ({:+.1})",
                report.baseline_score,
                report.current_score,
                report.score_delta()
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        c.metric, c.baseline, c.current, c.delta
                    );
                }
            }

            if report.new_cos > 0 {
                println!("\n{} new CO(s)", report.new_cos);
            }
            if report.removed_cos > 0 {
                println!("{} removed CO(s)", report.removed_cos);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
