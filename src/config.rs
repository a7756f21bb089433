//! Experiment configuration.
//!
//! Plain serde data. Loaded from JSON or assembled with the `with_*`
//! setters, then checked by [`ExperimentConfig::validate`] before an
//! experiment is created from it.

use serde::{Deserialize, Serialize};

use crate::complex::CoverageBuilder;
use crate::drainage::DrainageOptions;
use crate::gf2::Dimension;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Dimension D of the shared vector space.
    pub dimension: usize,
    /// Proximity radius for `compute_neighbors`.
    pub radius: f64,
    pub exclude_coverage_chords: bool,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub drainage: DrainageOptions,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dimension: 3,
            radius: 1.0,
            exclude_coverage_chords: false,
            seed: None,
            drainage: DrainageOptions::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn new(dimension: usize, radius: f64) -> Self {
        Self { dimension, radius, ..Self::default() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_exclude_coverage_chords(mut self, exclude: bool) -> Self {
        self.exclude_coverage_chords = exclude;
        self
    }

    pub fn with_drainage(mut self, drainage: DrainageOptions) -> Self {
        self.drainage = drainage;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Dimension::new(self.dimension)?;
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::ConfigError(format!(
                "radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        Ok(())
    }

    pub fn dimension(&self) -> Result<Dimension> {
        Dimension::new(self.dimension)
    }

    pub fn builder(&self) -> CoverageBuilder {
        CoverageBuilder::new().with_exclude_coverage_chords(self.exclude_coverage_chords)
    }
}
