//! bloomscore CLI: scores exam papers against a course's Bloom's taxonomy design.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bloomscore",
    version,
    about = "Exam paper alignment scoring against course outcomes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate question papers against a course design
    Evaluate {
        /// Sequence JSON declaring course outcomes and modules
        #[arg(long)]
        sequence: PathBuf,

        /// FormData JSON with course metadata
        #[arg(long)]
        form: Option<PathBuf>,

        /// Question sheets (CSV), one report per sheet
        #[arg(long, required = true, num_args = 1..)]
        questions: Vec<PathBuf>,

        /// Output directory (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, table, all
        #[arg(long, default_value = "all")]
        format: String,

        /// Max concurrent papers (default: parallelism from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the Bloom's verbs and level found in question texts
    Classify {
        /// Question texts
        #[arg(required = true)]
        texts: Vec<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a course design for authoring mistakes
    Validate {
        /// Sequence JSON declaring course outcomes and modules
        #[arg(long)]
        sequence: PathBuf,

        /// FormData JSON to check alongside
        #[arg(long)]
        form: Option<PathBuf>,
    },

    /// Compare two paper reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold in percentage points
        #[arg(long, default_value = "1.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and sample inputs
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bloomscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            sequence,
            form,
            questions,
            output,
            format,
            parallelism,
            config,
        } => {
            commands::evaluate::execute(
                sequence,
                form,
                questions,
                output,
                format,
                parallelism,
                config,
            )
            .await
        }
        Commands::Classify { texts, config } => commands::classify::execute(texts, config),
        Commands::Validate { sequence, form } => commands::validate::execute(sequence, form),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
