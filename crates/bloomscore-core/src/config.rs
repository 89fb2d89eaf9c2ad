//! Engine configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::policy::WeightedScorePolicy;
use crate::recommend::RecommendationPolicy;

/// Extra verbs merged over the built-in lexicon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Verb → level name.
    #[serde(default)]
    pub verbs: BTreeMap<String, String>,
}

/// Top-level bloomscore configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomscoreConfig {
    /// Max concurrent papers in batch evaluation.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub recommendations: RecommendationPolicy,
    #[serde(default)]
    pub score: WeightedScorePolicy,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./bloomscore-results")
}

impl Default for BloomscoreConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            recommendations: RecommendationPolicy::default(),
            score: WeightedScorePolicy::default(),
            lexicon: LexiconConfig::default(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `bloomscore.toml` in the current directory
/// 2. `~/.config/bloomscore/config.toml`
///
/// Environment variable overrides: `BLOOMSCORE_CO_THRESHOLD`,
/// `BLOOMSCORE_MODULE_THRESHOLD`.
pub fn load_config() -> Result<BloomscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BloomscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("bloomscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BloomscoreConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<BloomscoreConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Apply `BLOOMSCORE_*` overrides. Values that do not parse as a finite,
/// non-negative number are ignored.
pub fn apply_env_overrides<F>(config: &mut BloomscoreConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let threshold = |name: &str| -> Option<f64> {
        let raw = lookup(name)?;
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
            _ => {
                tracing::warn!("ignoring {name}={raw:?}: not a non-negative number");
                None
            }
        }
    };

    if let Some(v) = threshold("BLOOMSCORE_CO_THRESHOLD") {
        config.recommendations.co_threshold = v;
    }
    if let Some(v) = threshold("BLOOMSCORE_MODULE_THRESHOLD") {
        config.recommendations.module_threshold = v;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("bloomscore"))
}
