//! Advisor configuration
//!
//! Everything the advisor needs is passed once, at selection time. Values can
//! come from code, from `OTTER_INLINE_*` environment variables or, with the
//! `toml-config` feature, from a TOML file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AdvisorError, Result};

pub const ENV_MODE: &str = "OTTER_INLINE_MODE";
pub const ENV_SEED: &str = "OTTER_INLINE_SEED";
pub const ENV_FILE: &str = "OTTER_INLINE_FILE";
pub const ENV_PRETTY: &str = "OTTER_INLINE_PRETTY";

/// Document read in predefined mode and written in stochastic mode.
pub const DEFAULT_CONFIG_FILE: &str = "file.json";

/// Which policy drives a compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorMode {
    /// Random decisions from a seed, recorded on teardown
    #[default]
    #[serde(alias = "rand")]
    Stochastic,
    /// Decisions replayed from a recorded document
    #[serde(alias = "pred")]
    Predefined,
}

impl AdvisorMode {
    pub fn name(self) -> &'static str {
        match self {
            AdvisorMode::Stochastic => "stochastic",
            AdvisorMode::Predefined => "predefined",
        }
    }
}

impl fmt::Display for AdvisorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdvisorMode {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stochastic" | "rand" => Ok(AdvisorMode::Stochastic),
            "predefined" | "pred" => Ok(AdvisorMode::Predefined),
            _ => Err(AdvisorError::InvalidSetting {
                name: "advisor mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Inline advisor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Policy used for the whole compilation
    pub mode: AdvisorMode,

    /// Seed for stochastic mode. Taken from the clock when unset.
    pub seed: Option<u64>,

    /// Config document path
    pub config_path: PathBuf,

    /// Pretty-print recorded documents
    pub pretty: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            mode: AdvisorMode::Stochastic,
            seed: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            pretty: false,
        }
    }
}

impl AdvisorConfig {
    pub fn stochastic(seed: u64, config_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: AdvisorMode::Stochastic,
            seed: Some(seed),
            config_path: config_path.into(),
            pretty: false,
        }
    }

    pub fn predefined(config_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: AdvisorMode::Predefined,
            seed: None,
            config_path: config_path.into(),
            pretty: false,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_with_lookup(|key| std::env::var(key).ok())
    }

    /// Merge with environment variables (env vars take precedence)
    pub fn merge_with_env(self) -> Result<Self> {
        self.merge_with_lookup(|key| std::env::var(key).ok())
    }

    /// Override fields with whatever `lookup` yields for the `OTTER_INLINE_*`
    /// keys. A value that does not parse is an error, not a fallback.
    pub fn merge_with_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_MODE) {
            self.mode = val.parse()?;
        }

        if let Some(val) = lookup(ENV_SEED) {
            let seed = val.trim().parse().map_err(|_| AdvisorError::InvalidSetting {
                name: ENV_SEED,
                value: val.clone(),
            })?;
            self.seed = Some(seed);
        }

        if let Some(val) = lookup(ENV_FILE) {
            self.config_path = PathBuf::from(val);
        }

        if let Some(val) = lookup(ENV_PRETTY) {
            self.pretty = val.parse().map_err(|_| AdvisorError::InvalidSetting {
                name: ENV_PRETTY,
                value: val.clone(),
            })?;
        }

        Ok(self)
    }

    /// Initialize from an optional TOML file, then apply environment
    /// overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(path) => Self::from_file(path)?.merge_with_env(),
            None => Self::from_env(),
        }
    }

    /// [`load`](Self::load) with `lookup` in place of the process environment.
    pub fn load_with_lookup<F>(config_file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_lookup(lookup)
    }

    /// Seed to use, falling back to the current time in seconds.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        })
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml-config")]
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AdvisorError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|err| AdvisorError::InvalidSetting {
            name: "advisor config file",
            value: err.to_string(),
        })
    }

    /// Load configuration from TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn from_file(path: &Path) -> Result<Self> {
        Err(AdvisorError::InvalidSetting {
            name: "advisor config file (TOML support not enabled, enable the 'toml-config' feature)",
            value: path.display().to_string(),
        })
    }
}
