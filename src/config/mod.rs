//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-kind objective recording toggles.
    pub objectives: ObjectivesConfig,
    /// Tracer behavior.
    pub tracer: TracerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            objectives: ObjectivesConfig::default(),
            tracer: TracerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Env vars with `AUGUR_` prefix
    /// override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("AUGUR_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Alias for from_file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(path)
    }

    /// Load configuration from directory, looking for augur.toml or .augur/augur.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `AUGUR_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("augur.toml")))
            .merge(Toml::file(dir.join(".augur/augur.toml")))
            .merge(Env::prefixed("AUGUR_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Alias for load_default.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_default(dir)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Per-kind coverage-objective recording toggles.
///
/// A disabled kind is simply never folded into the objective map; the
/// instrumented program's behavior is unaffected either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectivesConfig {
    /// Record file-level objectives.
    pub files: bool,
    /// Record line-level objectives.
    pub lines: bool,
    /// Record branch objectives (comparisons, `&&`, `||`).
    pub branches: bool,
    /// Record statement objectives (ternary arms).
    pub statements: bool,
    /// Record success-call objectives.
    pub success_calls: bool,
}

impl Default for ObjectivesConfig {
    fn default() -> Self {
        Self {
            files: true,
            lines: true,
            branches: true,
            statements: true,
            success_calls: true,
        }
    }
}

/// Tracer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Record the input-variable sets declared by test actions.
    pub track_input_variables: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            track_input_variables: true,
        }
    }
}
