//! Generator configuration.

use hg_types::{config_error, ConfigError, HgResult};
use serde::{Deserialize, Serialize};

use crate::generator::MAX_BINS_PER_AXIS;
use crate::partition::NormalScheme;

/// Settings for a [`SampleGenerator`](crate::SampleGenerator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Requested number of samples; the effective count is
    /// `bins_per_axis ^ continuous_axes`.
    pub total_samples: usize,

    /// Fraction of each bin's half-width a draw may move away from the midpoint.
    #[serde(default)]
    pub jitter: f64,

    /// Seed for the jitter source. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fixed bin count per continuous axis, bypassing the sample-budget policy.
    #[serde(default)]
    pub bins_per_axis: Option<usize>,

    #[serde(default)]
    pub normal_scheme: NormalScheme,
}

impl GeneratorConfig {
    pub fn new(total_samples: usize, jitter: f64) -> Self {
        Self {
            total_samples,
            jitter,
            seed: None,
            bins_per_axis: None,
            normal_scheme: NormalScheme::default(),
        }
    }

    pub fn builder(total_samples: usize) -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::new(total_samples, 0.0),
        }
    }

    pub fn validate(&self) -> HgResult<()> {
        if self.total_samples == 0 {
            return Err(ConfigError::ZeroSamples.into());
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidJitter { value: self.jitter }.into());
        }
        match self.bins_per_axis {
            Some(0) => return Err(config_error!("bins_per_axis must be at least 1")),
            Some(bins) if bins > MAX_BINS_PER_AXIS => {
                return Err(config_error!(
                    "bins_per_axis {} exceeds the maximum of {}",
                    bins,
                    MAX_BINS_PER_AXIS
                ))
            }
            _ => {}
        }
        Ok(())
    }
}

/// Builder producing a validated [`GeneratorConfig`].
#[derive(Debug, Clone)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn bins_per_axis(mut self, bins: usize) -> Self {
        self.config.bins_per_axis = Some(bins);
        self
    }

    pub fn normal_scheme(mut self, scheme: NormalScheme) -> Self {
        self.config.normal_scheme = scheme;
        self
    }

    pub fn build(self) -> HgResult<GeneratorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
