//! JSON project files describing a search space and its sampling budget.
//!
//! ```json
//! {
//!   "hyperparameter": {
//!     "lr":     {"domain": "loguniform",  "data": [1e-5, 1e-1], "type": "float"},
//!     "layers": {"domain": "uniform",     "data": [1, 8],       "type": "int"},
//!     "act":    {"domain": "categorical", "data": ["relu", "tanh"], "type": "str"}
//!   },
//!   "max_iterations": 256,
//!   "jitter": 0.1,
//!   "seed": 7
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hg_sampler::{AxisData, NormalScheme};
use hg_types::{Domain, HgResult, ValueType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::search::SearchSpace;
use crate::trial::{OptimizationConfig, DEFAULT_MAX_ITERATIONS};

/// One entry of the `hyperparameter` table, kept as raw strings and JSON so
/// that errors can name the offending axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub domain: String,
    pub data: serde_json::Value,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub hyperparameter: BTreeMap<String, AxisSpec>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub jitter: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub bins_per_axis: Option<usize>,
    #[serde(default)]
    pub normal_scheme: NormalScheme,
}

impl ProjectFile {
    pub fn from_json_str(text: &str) -> HgResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> HgResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading project file");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parameters in name order, so a given file always yields the same stream.
    pub fn search_space(&self) -> HgResult<SearchSpace> {
        let mut space = SearchSpace::new();
        for (name, spec) in &self.hyperparameter {
            let domain: Domain = spec.domain.parse()?;
            let value_type: ValueType = spec.value_type.parse()?;
            let data = AxisData::from_json(name, domain, &spec.data)?;
            space = space.add(name.as_str(), data, domain, value_type);
        }
        Ok(space)
    }

    pub fn max_iterations(&self) -> usize {
        match self.max_iterations {
            Some(n) => n,
            None => {
                warn!(
                    default = DEFAULT_MAX_ITERATIONS,
                    "project has no max_iterations, using default"
                );
                DEFAULT_MAX_ITERATIONS
            }
        }
    }

    pub fn into_config(self, name: impl Into<String>) -> HgResult<OptimizationConfig> {
        let mut config = OptimizationConfig::new(name, self.search_space()?)
            .with_max_iterations(self.max_iterations())
            .with_jitter(self.jitter)
            .with_normal_scheme(self.normal_scheme);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(bins) = self.bins_per_axis {
            config = config.with_bins_per_axis(bins);
        }
        // Surface bad budgets and jitter before any sampling happens.
        config.generator_config()?;
        Ok(config)
    }
}
