//! Search space definitions and the quasi-random sweep strategy.

use hg_sampler::{AxisData, GeneratorConfig, SampleGenerator};
use hg_types::{Domain, HgResult, Sample, ValueType};
use serde::{Deserialize, Serialize};

/// A single parameter dimension in the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "learning_rate").
    pub name: String,
    pub domain: Domain,
    /// Bounds for continuous domains, literals for categorical ones.
    pub data: AxisData,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// The full search space: an ordered list of parameter definitions.
///
/// Registration order fixes the enumeration order of the generated stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<ParameterDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add(
        mut self,
        name: impl Into<String>,
        data: AxisData,
        domain: Domain,
        value_type: ValueType,
    ) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            domain,
            data,
            value_type,
        });
        self
    }

    pub fn add_uniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, AxisData::bounds(low, high), Domain::Uniform, ValueType::Float)
    }

    /// Uniform range whose draws are rounded to integers.
    pub fn add_int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(
            name,
            AxisData::bounds(low as f64, high as f64),
            Domain::Uniform,
            ValueType::Int,
        )
    }

    pub fn add_loguniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, AxisData::bounds(low, high), Domain::LogUniform, ValueType::Float)
    }

    pub fn add_normal(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, AxisData::bounds(low, high), Domain::Normal, ValueType::Float)
    }

    pub fn add_categorical(self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.add(
            name,
            AxisData::Categories(values),
            Domain::Categorical,
            ValueType::Categorical,
        )
    }

    pub fn add_bool(self, name: impl Into<String>) -> Self {
        self.add(
            name,
            AxisData::categories([false, true]),
            Domain::Categorical,
            ValueType::Bool,
        )
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Register every parameter with a fresh generator. The first invalid
    /// parameter aborts construction.
    pub fn generator(&self, config: GeneratorConfig) -> HgResult<SampleGenerator> {
        let mut generator = SampleGenerator::with_config(config)?;
        for param in &self.parameters {
            generator.set_axis(
                &param.name,
                param.data.clone(),
                param.domain,
                param.value_type,
            )?;
        }
        Ok(generator)
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Search strategies
// ---------------------------------------------------------------------------

/// Common trait for sample-producing search strategies.
pub trait SearchStrategy: Send {
    /// Next batch of at most `count` samples; empty once the strategy is spent.
    fn suggest(&mut self, count: usize) -> HgResult<Vec<Sample>>;

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

/// Evenly covering, binned sweep backed by a [`SampleGenerator`].
#[derive(Debug, Clone)]
pub struct QuasiRandomSearch {
    generator: SampleGenerator,
}

impl QuasiRandomSearch {
    pub fn new(space: &SearchSpace, config: GeneratorConfig) -> HgResult<Self> {
        Ok(Self {
            generator: space.generator(config)?,
        })
    }

    pub fn generator(&self) -> &SampleGenerator {
        &self.generator
    }

    pub fn next_sample(&mut self) -> HgResult<Option<Sample>> {
        self.generator.next_sample()
    }
}

impl SearchStrategy for QuasiRandomSearch {
    fn suggest(&mut self, count: usize) -> HgResult<Vec<Sample>> {
        let mut batch = Vec::with_capacity(count.min(self.generator.remaining()));
        while batch.len() < count {
            match self.generator.next_sample()? {
                Some(sample) => batch.push(sample),
                None => break,
            }
        }
        Ok(batch)
    }

    fn name(&self) -> &str {
        "quasi_random"
    }
}
