//! The `bloomscore classify` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use bloomscore_core::config::load_config_from;
use bloomscore_core::Evaluator;

pub fn execute(texts: Vec<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let evaluator = Evaluator::from_config(&config)?;
    let lexicon = evaluator.lexicon();

    let mut table = Table::new();
    table.set_header(vec!["Question", "Verbs", "Highest Verb", "Level"]);

    for text in &texts {
        let c = lexicon.classify(text);
        table.add_row(vec![
            Cell::new(text),
            Cell::new(if c.verbs.is_empty() {
                "-".to_string()
            } else {
                c.verbs.join(", ")
            }),
            Cell::new(c.highest_verb.as_deref().unwrap_or("-")),
            Cell::new(
                c.level
                    .map(|l| l.name())
                    .unwrap_or("unclassified"),
            ),
        ]);
    }

    println!("{table}");
    Ok(())
}
