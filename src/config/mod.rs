//! Configuration module for circuit-score
//!
//! This module handles:
//! - Project-level configuration (circuit-score.toml)
//! - User-level fallback (~/.config/circuit-score/config.toml)
//! - Environment overrides for the scoring knobs

mod project_config;

pub use project_config::{
    load_config,
    load_project_config,
    ProjectConfig,
    ScoringConfig,
    CONFIG_FILE_NAME,
    DEFAULT_CONFIG_TEMPLATE,
};
