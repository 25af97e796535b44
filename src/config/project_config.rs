//! Project-level configuration support
//!
//! Loads scoring configuration from `circuit-score.toml`.
//!
//! # Configuration Format
//!
//! ```toml
//! # circuit-score.toml
//!
//! [scoring]
//! max_iterations = 1000
//! row_epsilon = 1e-10
//! unparsed_layer_rank = 999
//! ```
//!
//! Environment variables override file values:
//! `CIRCUIT_SCORE_MAX_ITERATIONS`, `CIRCUIT_SCORE_ROW_EPSILON`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "circuit-score.toml";

/// Template written by `circuit-score init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# circuit-score configuration

[scoring]
# Propagation steps allowed before a graph is reported as non-convergent
max_iterations = 1000

# Floor for the absolute row sum during normalization (all-zero rows stay zero)
row_epsilon = 1e-10

# Sort rank given to layer labels that are not integers
unparsed_layer_rank = 999
"#;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Knobs for the influence scorer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Iteration ceiling for influence propagation (default: 1000)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Row-sum floor used when normalizing (default: 1e-10)
    #[serde(default = "default_row_epsilon")]
    pub row_epsilon: f64,

    /// Layer rank for non-numeric layer labels (default: 999)
    #[serde(default = "default_unparsed_layer_rank")]
    pub unparsed_layer_rank: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            row_epsilon: default_row_epsilon(),
            unparsed_layer_rank: default_unparsed_layer_rank(),
        }
    }
}

fn default_max_iterations() -> usize {
    1000
}

fn default_row_epsilon() -> f64 {
    1e-10
}

fn default_unparsed_layer_rank() -> i64 {
    999
}

impl ScoringConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_row_epsilon(mut self, eps: f64) -> Self {
        self.row_epsilon = eps;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if self.row_epsilon.is_nan() || self.row_epsilon <= 0.0 {
            return Err(format!(
                "row_epsilon must be positive, got {}",
                self.row_epsilon
            ));
        }
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CIRCUIT_SCORE_MAX_ITERATIONS") {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.max_iterations = n,
                Err(_) => warn!("Ignoring CIRCUIT_SCORE_MAX_ITERATIONS={:?}: not an integer", raw),
            }
        }
        if let Some(raw) = lookup("CIRCUIT_SCORE_ROW_EPSILON") {
            match raw.trim().parse::<f64>() {
                Ok(eps) => self.row_epsilon = eps,
                Err(_) => warn!("Ignoring CIRCUIT_SCORE_ROW_EPSILON={:?}: not a number", raw),
            }
        }
    }
}

/// Load configuration for a run.
///
/// An explicit path must exist and parse. Without one, the working
/// directory and then the user config directory are searched.
pub fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig> {
    let mut config = match explicit {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            load_project_config(&cwd)
        }
    };

    config
        .scoring
        .apply_overrides(|key| std::env::var(key).ok());

    config
        .scoring
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid scoring config: {}", e))?;

    Ok(config)
}

/// Find and load configuration starting at `dir`, falling back to defaults.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let candidates = [Some(dir.join(CONFIG_FILE_NAME)), user_config_path()];

    for path in candidates.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                return ProjectConfig::default();
            }
        }
    }

    debug!("No config found, using defaults");
    ProjectConfig::default()
}

/// Get the user config file path
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("circuit-score").join("config.toml"))
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.max_iterations, 1000);
        assert!((config.row_epsilon - 1e-10).abs() < 1e-20);
        assert_eq!(config.unparsed_layer_rank, 999);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: ProjectConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ProjectConfig = toml::from_str("[scoring]\nmax_iterations = 50\n").unwrap();
        assert_eq!(config.scoring.max_iterations, 50);
        assert_eq!(config.scoring.unparsed_layer_rank, 999);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ScoringConfig::default()
            .with_max_iterations(0)
            .validate()
            .is_err());
        assert!(ScoringConfig::default()
            .with_row_epsilon(0.0)
            .validate()
            .is_err());
        assert!(ScoringConfig::default()
            .with_row_epsilon(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CIRCUIT_SCORE_MAX_ITERATIONS", "25"),
            ("CIRCUIT_SCORE_ROW_EPSILON", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ScoringConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.max_iterations, 25);
        // Unparseable value is ignored
        assert!((config.row_epsilon - 1e-10).abs() < 1e-20);
    }

    #[test]
    fn test_load_project_config_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[scoring]\nunparsed_layer_rank = 500\n",
        )
        .unwrap();

        let config = load_project_config(dir.path());
        assert_eq!(config.scoring.unparsed_layer_rank, 500);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
