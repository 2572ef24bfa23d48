//! Run configuration.
//!
//! Everything an evaluation run needs, loadable from a JSON file. Missing
//! fields take their defaults; the binary then applies command-line overrides.

use crate::arena::evaluation::ColorAssignment;
use crate::arena::game_loop::GameSettings;
use crate::engine::EngineLimits;
use crate::mcts::hyperparameters::MctsConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Highest skill level a UCI engine accepts for `Skill Level`.
pub const MAX_SKILL_LEVEL: u8 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Reference engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the engine executable
    pub path: Option<PathBuf>,
    pub skill_level: u8,
    pub time_limit_ms: Option<u64>,
    pub depth_limit: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            skill_level: 6,
            time_limit_ms: Some(100),
            depth_limit: Some(5),
        }
    }
}

impl EngineConfig {
    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            time_limit_ms: self.time_limit_ms,
            depth: self.depth_limit,
        }
    }
}

/// Settings of one match against the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub rounds: u32,
    pub model_color: ColorAssignment,
    pub simulations: u32,
    pub temperature: f64,
    pub max_plies: u32,
    pub reuse_tree: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            model_color: ColorAssignment::Both,
            simulations: 800,
            temperature: 0.2,
            max_plies: 200,
            reuse_tree: false,
        }
    }
}

impl MatchConfig {
    pub fn game_settings(&self, engine_limits: EngineLimits) -> GameSettings {
        GameSettings {
            max_plies: self.max_plies,
            engine_limits,
            temperature: self.temperature,
            simulations: self.simulations,
            reuse_tree: self.reuse_tree,
        }
    }
}

/// Source of policy and value estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Trained transformer checkpoint (needs the `torch` feature)
    Transformer,
    /// Uniform priors and an even value
    Uniform,
}

impl FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transformer" => Ok(OracleKind::Transformer),
            "uniform" => Ok(OracleKind::Uniform),
            other => Err(format!("unknown oracle '{}', expected transformer or uniform", other)),
        }
    }
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleKind::Transformer => write!(f, "transformer"),
            OracleKind::Uniform => write!(f, "uniform"),
        }
    }
}

/// Complete configuration of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub engine: EngineConfig,
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub mcts: MctsConfig,
    /// Levels played when no single skill level is requested
    pub skill_levels: Vec<u8>,
    /// Rounds per colour at each sweep level
    pub sweep_rounds: u32,
    pub output_dir: PathBuf,
    pub seed: u64,
    pub oracle: OracleKind,
    pub checkpoint: Option<PathBuf>,
    pub model_config: Option<PathBuf>,
    /// UCI move list, one per line. The built-in vocabulary when absent.
    pub vocabulary: Option<PathBuf>,
    /// `cpu` or `cuda`
    pub device: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            match_config: MatchConfig::default(),
            mcts: MctsConfig::default(),
            skill_levels: vec![1, 3, 5, 7, 10],
            sweep_rounds: 10,
            output_dir: PathBuf::from("evaluation_results"),
            seed: 42,
            oracle: OracleKind::Transformer,
            checkpoint: None,
            model_config: None,
            vocabulary: None,
            device: "cpu".to_string(),
        }
    }
}

impl EvaluationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: EvaluationConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mcts.validate().map_err(ConfigError::Invalid)?;

        let m = &self.match_config;
        if m.simulations == 0 {
            return Err(ConfigError::Invalid("simulations must be at least 1".into()));
        }
        if !(m.temperature.is_finite() && m.temperature >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be a non-negative number, got {}",
                m.temperature
            )));
        }
        if m.max_plies == 0 {
            return Err(ConfigError::Invalid("max_plies must be at least 1".into()));
        }

        let levels = std::iter::once(self.engine.skill_level).chain(self.skill_levels.iter().copied());
        for level in levels {
            if level > MAX_SKILL_LEVEL {
                return Err(ConfigError::Invalid(format!(
                    "skill level {} is above the maximum of {}",
                    level, MAX_SKILL_LEVEL
                )));
            }
        }
        if self.engine.time_limit_ms == Some(0) || self.engine.depth_limit == Some(0) {
            return Err(ConfigError::Invalid("engine limits must be positive when set".into()));
        }

        if self.oracle == OracleKind::Transformer && (self.checkpoint.is_none() || self.model_config.is_none()) {
            return Err(ConfigError::Invalid(
                "the transformer oracle needs both a checkpoint and a model config".into(),
            ));
        }
        if !matches!(self.device.as_str(), "cpu" | "cuda") {
            return Err(ConfigError::Invalid(format!(
                "device must be cpu or cuda, got '{}'",
                self.device
            )));
        }
        Ok(())
    }
}
