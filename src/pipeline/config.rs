//! Simulator configuration parser
//!
//! Parses `greenlight.toml` into structured settings. Every key has a
//! default, so a missing file or an empty file yields a usable config.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Checkpoint and catalog settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    /// Include the AI Merge Conflict Check stage in the catalog
    #[serde(default = "default_merge_check")]
    pub merge_check: bool,
    /// Build & Test fails when the random draw exceeds this threshold
    #[serde(default = "default_build_threshold")]
    pub build_failure_threshold: f64,
    /// Deploy to Production fails when the random draw exceeds this threshold
    #[serde(default = "default_deploy_threshold")]
    pub deploy_failure_threshold: f64,
}

const fn default_merge_check() -> bool {
    true
}

const fn default_build_threshold() -> f64 {
    0.75
}

const fn default_deploy_threshold() -> f64 {
    0.8
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            merge_check: default_merge_check(),
            build_failure_threshold: default_build_threshold(),
            deploy_failure_threshold: default_deploy_threshold(),
        }
    }
}

/// Cosmetic pacing delays between and within stages, in milliseconds.
///
/// These model pipeline rhythm, not correctness; tests set them to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PacingConfig {
    /// Pause after each completed stage
    #[serde(default = "default_stage_pause_ms")]
    pub stage_pause_ms: u64,
    /// Simulated build-and-test duration
    #[serde(default = "default_build_wait_ms")]
    pub build_wait_ms: u64,
    /// Simulated staging deployment duration
    #[serde(default = "default_staging_wait_ms")]
    pub staging_wait_ms: u64,
    /// Simulated production deployment duration
    #[serde(default = "default_production_wait_ms")]
    pub production_wait_ms: u64,
}

const fn default_stage_pause_ms() -> u64 {
    500
}

const fn default_build_wait_ms() -> u64 {
    2000
}

const fn default_staging_wait_ms() -> u64 {
    1500
}

const fn default_production_wait_ms() -> u64 {
    2000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            stage_pause_ms: default_stage_pause_ms(),
            build_wait_ms: default_build_wait_ms(),
            staging_wait_ms: default_staging_wait_ms(),
            production_wait_ms: default_production_wait_ms(),
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeminiConfig {
    /// Model used for all stage content generation
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

/// Top-level configuration parsed from greenlight.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Checkpoint and catalog settings
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Pacing delays
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Gemini API settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl PipelineConfig {
    /// Parse a greenlight.toml file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse greenlight.toml content from a string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse greenlight.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a path, falling back to defaults when the file is missing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        validate_threshold(
            "build_failure_threshold",
            self.pipeline.build_failure_threshold,
        )?;
        validate_threshold(
            "deploy_failure_threshold",
            self.pipeline.deploy_failure_threshold,
        )?;
        if self.gemini.model.trim().is_empty() {
            bail!("Gemini model name cannot be empty");
        }
        Ok(())
    }
}

/// A failure threshold is compared against a uniform draw in [0, 1),
/// so values outside that range make a checkpoint impossible to pass
/// or impossible to fail by accident rather than by intent.
fn validate_threshold(key: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("Invalid {key} {value}: must be within [0.0, 1.0]");
    }
    Ok(())
}
