//! Run configuration and the pre-flight checks performed before any mesh work.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sfi_inp::DeckBuffer;
use sfi_model::{ScaleError, ScaleRange};
use thiserror::Error;
use tracing::info;

use crate::assembly::AssemblyModel;
use crate::error::{IoError, Result};
use crate::rules::{FileRuleLoader, RuleLoader};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Scale(#[from] ScaleError),

    #[error("no default job name given")]
    NoJob,

    #[error("no rule script given")]
    NoRules,

    #[error("deck {path} is unusable: {message}")]
    InvalidDeck { path: PathBuf, message: String },

    #[error("no active model: deck {path} defines no part instances")]
    NoActiveModel { path: PathBuf },

    #[error("rule script {path} is invalid: {message}")]
    InvalidRules { path: String, message: String },

    #[error("rule script {path} does not define a stress function")]
    NoStressFunction { path: String },
}

/// Everything one generation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base name for output jobs and the manifest.
    pub job_name: String,
    pub deck: PathBuf,
    pub rules: Option<PathBuf>,
    pub scale_count: usize,
    pub scale_min: f64,
    pub scale_max: f64,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            job_name: String::new(),
            deck: PathBuf::new(),
            rules: None,
            scale_count: 1,
            scale_min: 1.0,
            scale_max: 1.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn scale_range(&self) -> std::result::Result<ScaleRange, ConfigError> {
        Ok(ScaleRange::new(self.scale_count, self.scale_min, self.scale_max)?)
    }

    /// File loader for the configured rule script.
    pub fn rule_loader(&self) -> std::result::Result<FileRuleLoader, ConfigError> {
        self.rules.as_ref().map(|path| FileRuleLoader::new(path)).ok_or(ConfigError::NoRules)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_stress_inputs.json", self.job_name))
    }
}

/// State established by a successful pre-flight pass.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub scales: ScaleRange,
    pub deck: DeckBuffer,
    pub model: AssemblyModel,
}

/// Runs every configuration check in order and stops at the first failure.
///
/// A rules path must be configured; the script itself is read through
/// `rules`, which need not be a [`FileRuleLoader`].
pub fn preflight(config: &RunConfig, rules: &dyn RuleLoader) -> std::result::Result<Preflight, ConfigError> {
    info!("performing checks");
    let scales = config.scale_range()?;

    if config.job_name.trim().is_empty() {
        return Err(ConfigError::NoJob);
    }

    let invalid_deck = |err: IoError| ConfigError::InvalidDeck {
        path: config.deck.clone(),
        message: err.to_string(),
    };
    let deck = DeckBuffer::read_file(&config.deck).map_err(|err| invalid_deck(err.into()))?;
    let model = AssemblyModel::from_buffer(&deck).map_err(invalid_deck)?;
    if model.instance_count() == 0 {
        return Err(ConfigError::NoActiveModel {
            path: config.deck.clone(),
        });
    }

    if config.rules.is_none() {
        return Err(ConfigError::NoRules);
    }
    let script = rules.load().map_err(|err| ConfigError::InvalidRules {
        path: rules.describe(),
        message: err.to_string(),
    })?;
    if script.stress_function().is_none() {
        return Err(ConfigError::NoStressFunction {
            path: rules.describe(),
        });
    }

    info!("checks passed");
    Ok(Preflight { scales, deck, model })
}
