//! bloomscore-core: exam paper alignment engine.
//!
//! Classifies exam questions by cognitive level, normalizes the course's
//! declared Bloom's levels onto a dense ordinal scale, and scores the paper
//! against its course outcomes and module teaching hours.

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod lexicon;
pub mod model;
pub mod normalizer;
pub mod policy;
pub mod recommend;
pub mod report;
pub mod results;
pub mod scoring;
pub mod sequence;

pub use engine::{Evaluation, Evaluator};
pub use error::{ConfigError, IngestError};
pub use lexicon::Lexicon;
pub use model::{BloomLevel, CourseDesign, Question};
pub use normalizer::BloomLevelMap;
pub use results::EvaluationResult;
