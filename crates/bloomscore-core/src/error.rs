//! Engine error types.
//!
//! Configuration errors fail a whole evaluation run, since the CO and module
//! tables feed every downstream stage. Row-level problems never surface here;
//! ingestion recovers from them by defaulting.

use thiserror::Error;

/// Errors raised while parsing course configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `Sequence` payload is not valid JSON or has the wrong shape.
    #[error("invalid Sequence JSON: {0}")]
    InvalidSequence(#[source] serde_json::Error),

    /// The `FormData` payload is not valid JSON.
    #[error("invalid FormData JSON: {0}")]
    InvalidFormData(#[source] serde_json::Error),

    /// The payload parsed, but is not the expected JSON type.
    #[error("{payload} must be a JSON {expected}")]
    UnexpectedShape {
        payload: &'static str,
        expected: &'static str,
    },

    /// A lexicon override names a level outside the six canonical levels.
    #[error("unknown Bloom's level '{level}' for verb '{verb}'")]
    UnknownLevel { verb: String, level: String },

    /// A lexicon override could not be compiled into a pattern.
    #[error("invalid lexicon pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while reading the question spreadsheet.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The header row lacks a required column.
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    /// The row source could not be read.
    #[error("failed to read question rows: {0}")]
    Read(#[from] csv::Error),
}
