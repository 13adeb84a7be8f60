//! Engine configuration
//!
//! Ranking defaults loaded from a TOML file or environment variables. Every
//! entry point also accepts explicit arguments; the config only supplies the
//! values used when a caller passes none.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable defaults for the ranking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Base annealing for batch passes (reprocessing, reputation runs).
    #[serde(default = "default_annealing")]
    pub annealing: f64,
    /// Annealing for live single-comparison updates.
    #[serde(default = "default_comparison_annealing")]
    pub comparison_annealing: f64,
    /// Outer iterations of the reputation fixed point.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Inner small-alpha passes over each reviewer's latest ordering; unset
    /// switches the reputation run to chronological all-comparisons mode.
    #[serde(default = "default_last_comparisons")]
    pub last_comparisons: Option<usize>,
    /// Non-zero activates the rank-power cost during task sampling.
    #[serde(default)]
    pub rank_cost_coefficient: f64,
    /// If true, a reviewer may be offered their own submission.
    #[serde(default)]
    pub can_rank_own_submissions: bool,
    /// Accuracy normaliser used when a venue does not configure
    /// `number_of_submissions_per_reviewer`.
    #[serde(default = "default_reviews_fallback")]
    pub submissions_per_reviewer_fallback: u32,
    /// Fixed seed for the samplers; unset draws from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default value functions
fn default_annealing() -> f64 { 0.5 }
fn default_comparison_annealing() -> f64 { 0.6 }
fn default_iterations() -> usize { 4 }
fn default_last_comparisons() -> Option<usize> { Some(10) }
fn default_reviews_fallback() -> u32 { 5 }

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            annealing: default_annealing(),
            comparison_annealing: default_comparison_annealing(),
            iterations: default_iterations(),
            last_comparisons: default_last_comparisons(),
            rank_cost_coefficient: 0.0,
            can_rank_own_submissions: false,
            submissions_per_reviewer_fallback: default_reviews_fallback(),
            seed: None,
        }
    }
}

impl RankerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        let config: RankerConfig = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from a file with environment variable overrides.
    ///
    /// Environment variables take precedence over config file values.
    /// Format: `CROWDRANK_<KEY>` (e.g. `CROWDRANK_ITERATIONS=8`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CROWDRANK_ANNEALING") {
            if let Ok(v) = value.parse() {
                self.annealing = v;
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_COMPARISON_ANNEALING") {
            if let Ok(v) = value.parse() {
                self.comparison_annealing = v;
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_ITERATIONS") {
            if let Ok(v) = value.parse() {
                self.iterations = v;
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_LAST_COMPARISONS") {
            // "none" selects chronological mode.
            if value.eq_ignore_ascii_case("none") {
                self.last_comparisons = None;
            } else if let Ok(v) = value.parse() {
                self.last_comparisons = Some(v);
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_COST_COEFFICIENT") {
            if let Ok(v) = value.parse() {
                self.rank_cost_coefficient = v;
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_CAN_RANK_OWN") {
            if let Ok(v) = value.parse() {
                self.can_rank_own_submissions = v;
            }
        }
        if let Ok(value) = std::env::var("CROWDRANK_SEED") {
            if let Ok(v) = value.parse() {
                self.seed = Some(v);
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.annealing > 0.0 && self.annealing <= 1.0) {
            anyhow::bail!("annealing must be in (0, 1]");
        }
        if !(self.comparison_annealing > 0.0 && self.comparison_annealing <= 1.0) {
            anyhow::bail!("comparison_annealing must be in (0, 1]");
        }
        if self.iterations == 0 {
            anyhow::bail!("iterations must be at least 1");
        }
        if self.last_comparisons == Some(0) {
            anyhow::bail!("last_comparisons must be at least 1 when set");
        }
        if self.rank_cost_coefficient < 0.0 {
            anyhow::bail!("rank_cost_coefficient must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RankerConfig::default();
        assert_eq!(config.annealing, 0.5);
        assert_eq!(config.comparison_annealing, 0.6);
        assert_eq!(config.iterations, 4);
        assert_eq!(config.last_comparisons, Some(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "iterations = 2\nrank_cost_coefficient = 1.5").unwrap();
        let config = RankerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.iterations, 2);
        assert_eq!(config.rank_cost_coefficient, 1.5);
        assert_eq!(config.annealing, 0.5);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CROWDRANK_ITERATIONS", "9");
        std::env::set_var("CROWDRANK_LAST_COMPARISONS", "none");

        let mut config = RankerConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.iterations, 9);
        assert_eq!(config.last_comparisons, None);

        std::env::remove_var("CROWDRANK_ITERATIONS");
        std::env::remove_var("CROWDRANK_LAST_COMPARISONS");
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = RankerConfig::default();
        config.annealing = 0.0;
        assert!(config.validate().is_err());

        let mut config = RankerConfig::default();
        config.last_comparisons = Some(0);
        assert!(config.validate().is_err());
    }
}
