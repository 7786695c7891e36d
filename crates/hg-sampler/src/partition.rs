//! Range partitioners: split `[lo, hi]` into `n` contiguous bins.
//!
//! Every partitioner returns `n + 1` strictly increasing boundaries whose
//! first and last entries are exactly `lo` and `hi`.

use hg_types::{ConfigError, Domain, HgError, NumericalError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantile::inverse_normal_cdf;

/// Number of standard deviations between the midpoint and either bound of a
/// normal-domain axis.
pub const TAIL_SIGMAS: f64 = 2.5;

/// `P(Z < -2.5)` for a standard normal `Z`.
const TAIL_MASS: f64 = 0.006_209_665_325_776_159;

/// Clip for cumulative-probability levels fed to the quantile function.
const LEVEL_EPSILON: f64 = 1e-12;

/// Failure of a pure partitioner call. Carries no axis context; see
/// [`PartitionError::for_axis`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    #[error("lower bound {lo} must be finite and below upper bound {hi}")]
    InvalidBounds { lo: f64, hi: f64 },

    #[error("log-uniform lower bound must be positive, got {lo}")]
    NonPositiveLogBound { lo: f64 },

    #[error("bin count must be at least 1")]
    ZeroBins,

    #[error("boundary {index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },

    #[error("bin {index} collapsed to zero width at {value}")]
    Degenerate { index: usize, value: f64 },
}

impl PartitionError {
    /// Attach the axis name, mapping into the configuration or numerical
    /// branch of the error taxonomy.
    pub fn for_axis(self, axis: &str) -> HgError {
        let axis = axis.to_string();
        match self {
            Self::InvalidBounds { lo, hi } => ConfigError::InvalidBounds { axis, lo, hi }.into(),
            Self::NonPositiveLogBound { lo } => ConfigError::NonPositiveLogBound { axis, lo }.into(),
            Self::ZeroBins => ConfigError::ZeroBins { axis }.into(),
            Self::NonFinite { index, value } => {
                NumericalError::NonFiniteBoundary { axis, index, value }.into()
            }
            Self::Degenerate { index, value } => {
                NumericalError::DegenerateBin { axis, index, value }.into()
            }
        }
    }
}

/// How the normal-domain partitioner spreads its bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalScheme {
    /// Bin widths proportional to the inverse bell density at each slot,
    /// mirrored about the midpoint.
    #[default]
    DensityWeighted,
    /// Equal probability mass per bin between the ±2.5σ tails, via the
    /// clipped inverse CDF.
    EqualMass,
}

/// Per-domain partitioning capability.
pub trait Partitioner: Send + Sync {
    /// Compute `n + 1` boundaries covering `[lo, hi]`.
    fn boundaries(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError>;

    /// Boundaries grouped as `[lower, upper]` pairs, one per bin.
    fn ranges(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<[f64; 2]>, PartitionError> {
        Ok(pairs(&self.boundaries(lo, hi, n)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPartitioner;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogUniformPartitioner;

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalPartitioner {
    pub scheme: NormalScheme,
}

impl Partitioner for UniformPartitioner {
    fn boundaries(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
        check_bounds(lo, hi, n)?;
        let width = hi - lo;
        let boundaries = (0..=n)
            .map(|i| {
                if i == n {
                    hi
                } else {
                    lo + i as f64 * width / n as f64
                }
            })
            .collect();
        finite(boundaries)
    }
}

impl Partitioner for LogUniformPartitioner {
    fn boundaries(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
        if lo.is_finite() && lo <= 0.0 {
            return Err(PartitionError::NonPositiveLogBound { lo });
        }
        check_bounds(lo, hi, n)?;
        let log_lo = lo.ln();
        let log_hi = hi.ln();
        let boundaries = (0..=n)
            .map(|i| match i {
                0 => lo,
                i if i == n => hi,
                i => (log_lo + i as f64 * (log_hi - log_lo) / n as f64).exp(),
            })
            .collect();
        finite(boundaries)
    }
}

impl Partitioner for NormalPartitioner {
    fn boundaries(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
        check_bounds(lo, hi, n)?;
        let unit = match self.scheme {
            NormalScheme::DensityWeighted => density_weighted_unit(n),
            NormalScheme::EqualMass => equal_mass_unit(n)?,
        };
        let width = hi - lo;
        let boundaries = unit
            .iter()
            .enumerate()
            .map(|(i, &t)| if i == n { hi } else { lo + t * width })
            .collect();
        finite(boundaries)
    }
}

/// Boundaries on `[0, 1]` for the density-weighted scheme.
///
/// Each half-axis holds `n / 2` slots at standardized abscissae
/// `z_k = 2.5 k / (n / 2)`; a slot's width is `exp(z_k² / 2)`. Odd `n` adds a
/// centre bin made of two half-weight slots at `z = 0`.
fn density_weighted_unit(n: usize) -> Vec<f64> {
    let half = n / 2;
    let slots = if n % 2 == 0 {
        half as f64
    } else {
        half as f64 + 0.5
    };
    let slot_width = |k: usize| {
        let z = TAIL_SIGMAS * k as f64 / slots;
        (z * z / 2.0).exp()
    };

    let mut widths = Vec::with_capacity(n);
    if n % 2 == 0 {
        widths.extend((0..half).rev().map(slot_width));
        widths.extend((0..half).map(slot_width));
    } else {
        widths.extend((1..=half).rev().map(slot_width));
        widths.push(slot_width(0));
        widths.extend((1..=half).map(slot_width));
    }
    normalized_cumulative(&widths)
}

/// Boundaries on `[0, 1]` for the equal-mass scheme.
fn equal_mass_unit(n: usize) -> Result<Vec<f64>, PartitionError> {
    let p_lo = TAIL_MASS;
    let p_hi = 1.0 - TAIL_MASS;
    let z: Vec<f64> = (0..=n)
        .map(|i| {
            let level = p_lo + i as f64 * (p_hi - p_lo) / n as f64;
            inverse_normal_cdf(level.clamp(LEVEL_EPSILON, 1.0 - LEVEL_EPSILON))
        })
        .collect();
    if let Some((index, &value)) = z.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PartitionError::NonFinite { index, value });
    }
    let (first, last) = (z[0], z[n]);
    Ok(z.iter().map(|v| (v - first) / (last - first)).collect())
}

fn normalized_cumulative(widths: &[f64]) -> Vec<f64> {
    let total: f64 = widths.iter().sum();
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(widths.len() + 1);
    out.push(0.0);
    for w in widths {
        acc += w;
        out.push(acc / total);
    }
    out
}

fn check_bounds(lo: f64, hi: f64, n: usize) -> Result<(), PartitionError> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(PartitionError::InvalidBounds { lo, hi });
    }
    if n == 0 {
        return Err(PartitionError::ZeroBins);
    }
    Ok(())
}

fn finite(boundaries: Vec<f64>) -> Result<Vec<f64>, PartitionError> {
    if let Some((index, &value)) = boundaries.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PartitionError::NonFinite { index, value });
    }
    if let Some(index) = boundaries.windows(2).position(|w| w[0] >= w[1]) {
        return Err(PartitionError::Degenerate {
            index,
            value: boundaries[index],
        });
    }
    Ok(boundaries)
}

fn pairs(boundaries: &[f64]) -> Vec<[f64; 2]> {
    boundaries.windows(2).map(|w| [w[0], w[1]]).collect()
}

/// Select the partitioner for a continuous domain; `None` for categorical.
pub fn partitioner_for(domain: Domain, scheme: NormalScheme) -> Option<Box<dyn Partitioner>> {
    match domain {
        Domain::Uniform => Some(Box::new(UniformPartitioner)),
        Domain::LogUniform => Some(Box::new(LogUniformPartitioner)),
        Domain::Normal => Some(Box::new(NormalPartitioner { scheme })),
        Domain::Categorical => None,
    }
}

pub fn uniform_boundaries(lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
    UniformPartitioner.boundaries(lo, hi, n)
}

pub fn loguniform_boundaries(lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
    LogUniformPartitioner.boundaries(lo, hi, n)
}

pub fn normal_boundaries(lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PartitionError> {
    NormalPartitioner::default().boundaries(lo, hi, n)
}

pub fn uniform_ranges(lo: f64, hi: f64, n: usize) -> Result<Vec<[f64; 2]>, PartitionError> {
    UniformPartitioner.ranges(lo, hi, n)
}

pub fn loguniform_ranges(lo: f64, hi: f64, n: usize) -> Result<Vec<[f64; 2]>, PartitionError> {
    LogUniformPartitioner.ranges(lo, hi, n)
}

pub fn normal_ranges(lo: f64, hi: f64, n: usize) -> Result<Vec<[f64; 2]>, PartitionError> {
    NormalPartitioner::default().ranges(lo, hi, n)
}
