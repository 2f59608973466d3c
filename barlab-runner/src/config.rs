//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [engine]
//! symbol = "BTCUSDT"
//! initial_cash = 1000000.0
//! commission_rate = 0.0007
//!
//! [data]
//! path = "data/btcusdt_1m.csv"
//!
//! [strategy]
//! name = "channel_breakout"
//! params = { window = 15, quantity = 1 }
//!
//! [sweep]
//! parallel = true
//! params = { window = [5, 15, 30] }
//! ```

use barlab_core::engine::{ConfigError, EngineConfig};
use barlab_core::strategy::Params;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Rejected or unreadable runner configuration.
#[derive(Debug, Error)]
pub enum RunnerConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Engine(#[from] ConfigError),

    #[error("strategy name must not be empty")]
    EmptyStrategyName,

    #[error("parameter '{name}' must be finite, got {value}")]
    NonFiniteParam { name: String, value: f64 },

    #[error("sweep parameter '{0}' has no candidate values")]
    EmptySweepParam(String),
}

/// Full configuration for a run or sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV bar file. Relative paths resolve against the working directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub params: Params,
}

/// Candidate values per parameter; the sweep runs their cross product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    pub params: BTreeMap<String, Vec<f64>>,
}

fn default_parallel() -> bool {
    true
}

impl BacktestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, RunnerConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, RunnerConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunnerConfigError> {
        self.engine.validate()?;
        if self.strategy.name.trim().is_empty() {
            return Err(RunnerConfigError::EmptyStrategyName);
        }
        for (name, &value) in &self.strategy.params {
            check_finite(name, value)?;
        }
        if let Some(sweep) = &self.sweep {
            for (name, values) in &sweep.params {
                if values.is_empty() {
                    return Err(RunnerConfigError::EmptySweepParam(name.clone()));
                }
                for &value in values {
                    check_finite(name, value)?;
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs get the same RunId.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), RunnerConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RunnerConfigError::NonFiniteParam {
            name: name.to_string(),
            value,
        })
    }
}
