//! # hg-sampler
//!
//! Deterministic, evenly covering sample streams over hyperparameter axes.
//!
//! Each continuous axis is cut into contiguous bins by a domain-specific
//! partitioner (uniform, log-uniform, Gaussian-weighted); categorical axes
//! contribute one bin per literal. [`SampleGenerator`] walks the Cartesian
//! product of continuous bins exactly once, drawing an optionally jittered
//! point inside each selected bin and cycling categorical literals.

mod axis;
mod config;
mod generator;
mod partition;
mod quantile;

pub use axis::{Axis, AxisData, Bin};
pub use config::{GeneratorConfig, GeneratorConfigBuilder};
pub use generator::{bins_per_axis, SampleGenerator, MAX_BINS_PER_AXIS};
pub use partition::{
    loguniform_boundaries, loguniform_ranges, normal_boundaries, normal_ranges, partitioner_for,
    uniform_boundaries, uniform_ranges, LogUniformPartitioner, NormalPartitioner, NormalScheme,
    PartitionError, Partitioner, UniformPartitioner,
};
pub use quantile::inverse_normal_cdf;
