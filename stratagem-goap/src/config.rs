// TOML-backed tuning knobs for the planner's search budget.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Search limits for the backward planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum number of frontier expansions before planning gives up.
    pub max_iterations: usize,
    /// Nodes whose path already reaches this many steps are not expanded
    /// further.
    pub max_plan_length: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_plan_length: 64,
        }
    }
}

impl PlannerConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadFailed(e.to_string()))?;

        let config: PlannerConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => {
                tracing::info!("loaded planner config from {:?}", path.as_ref());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "failed to load planner config from {:?}: {}. Using defaults.",
                    path.as_ref(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "max_iterations must be positive".to_string(),
            ));
        }
        if self.max_plan_length == 0 {
            return Err(ConfigError::InvalidValue(
                "max_plan_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
