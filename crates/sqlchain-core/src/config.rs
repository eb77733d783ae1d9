//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [plan_cache]
//! enabled = true
//! depth = 100
//!
//! [session]
//! debug = false
//! ```

use crate::DEFAULT_PLAN_CACHE_DEPTH;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("plan_cache.depth must be at least 1")]
    ZeroDepth,
}

///
/// CoreConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub plan_cache: PlanCacheConfig,
    pub session: SessionConfig,
}

impl CoreConfig {
    /// Parse and validate a TOML document; missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.plan_cache.validate()
    }
}

///
/// PlanCacheConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanCacheConfig {
    /// When false every request compiles and nothing is retained.
    pub enabled: bool,
    /// Maximum number of retained plans, and the bound on one lookup scan.
    pub depth: usize,
}

impl PlanCacheConfig {
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }

        Ok(())
    }
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: DEFAULT_PLAN_CACHE_DEPTH,
        }
    }
}

///
/// SessionConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Raise per-query explain output from `trace` to `debug`.
    pub debug: bool,
}

///
/// TESTS
///
