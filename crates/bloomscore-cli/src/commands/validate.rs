//! The `bloomscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use bloomscore_core::sequence::{load_form_data, load_sequence, validate_course_design};
use bloomscore_core::BloomLevelMap;

pub fn execute(sequence_path: PathBuf, form_path: Option<PathBuf>) -> Result<()> {
    let design = load_sequence(&sequence_path)?;
    println!(
        "Course design: {} outcome(s), {} module(s)",
        design.outcomes.len(),
        design.modules.len()
    );

    if let Some(path) = &form_path {
        let form = load_form_data(path)?;
        println!("Form data: {} field(s)", form.0.len());
    }

    let map = BloomLevelMap::for_design(&design);
    let levels: Vec<String> = map.iter().map(|(level, o)| format!("{level}={o}")).collect();
    println!("Level map: {}", levels.join(", "));

    let warnings = validate_course_design(&design);
    for w in &warnings {
        let prefix = w
            .key
            .as_ref()
            .map(|key| format!("  [{key}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Course design valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
