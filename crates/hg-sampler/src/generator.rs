//! Single-pass enumeration of binned samples.

use hg_types::{internal_error, ConfigError, Domain, HgResult, Sample, StateError, ValueType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::axis::{Axis, AxisData, Bin};
use crate::config::GeneratorConfig;

/// Largest bin table a continuous axis may hold.
pub const MAX_BINS_PER_AXIS: usize = 1 << 20;

/// Bin count per continuous axis such that `k ^ continuous_axes` is as close
/// as possible to `total_samples`. Zero when there are no continuous axes.
pub fn bins_per_axis(total_samples: usize, continuous_axes: usize) -> usize {
    if continuous_axes == 0 {
        return 0;
    }
    let k = (total_samples as f64)
        .powf(1.0 / continuous_axes as f64)
        .round();
    (k as usize).max(1)
}

/// Produces a fixed, finite stream of samples covering the registered axes.
///
/// The cursor walks the Cartesian product of continuous-axis bins in
/// mixed-radix order, the last registered axis advancing fastest.
/// Categorical axes do not enlarge the grid; they cycle through their
/// literals as the cursor advances. Once every combination has been
/// produced the generator stays exhausted.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    config: GeneratorConfig,
    axes: Vec<Axis>,
    bins_per_axis: usize,
    cursor: usize,
    total: usize,
    started: bool,
    exhausted: bool,
    rng: ChaCha8Rng,
}

impl SampleGenerator {
    pub fn new(total_samples: usize, jitter: f64) -> HgResult<Self> {
        Self::with_config(GeneratorConfig::new(total_samples, jitter))
    }

    pub fn with_config(config: GeneratorConfig) -> HgResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            config,
            axes: Vec::new(),
            bins_per_axis: 0,
            cursor: 0,
            total: 0,
            started: false,
            exhausted: false,
            rng,
        })
    }

    /// Register an axis. On any error the generator is left unchanged.
    ///
    /// Adding a continuous axis changes the per-axis bin count, so every
    /// continuous axis is re-partitioned before the new one is committed.
    pub fn set_axis(
        &mut self,
        name: &str,
        data: AxisData,
        domain: Domain,
        value_type: ValueType,
    ) -> HgResult<()> {
        if self.started {
            return Err(StateError::SamplingStarted {
                name: name.to_string(),
            }
            .into());
        }
        if self.axes.iter().any(|a| a.name() == name) {
            return Err(ConfigError::DuplicateAxis {
                name: name.to_string(),
            }
            .into());
        }

        let scheme = self.config.normal_scheme;
        if !domain.is_continuous() {
            let axis = Axis::new(name, data, domain, value_type, 1, scheme)?;
            debug!(
                "Registered categorical axis {} with {} categories",
                name,
                axis.bin_count()
            );
            self.axes.push(axis);
            return Ok(());
        }

        let continuous = self.continuous_count() + 1;
        let k = self
            .config
            .bins_per_axis
            .unwrap_or_else(|| bins_per_axis(self.config.total_samples, continuous));
        if k > MAX_BINS_PER_AXIS {
            return Err(ConfigError::TooManyBins {
                axis: name.to_string(),
                bins: k,
                max: MAX_BINS_PER_AXIS,
            }
            .into());
        }
        let axis = Axis::new(name, data, domain, value_type, k, scheme)?;

        let mut rebinned = Vec::new();
        if k != self.bins_per_axis {
            for (i, existing) in self.axes.iter().enumerate() {
                if !existing.is_categorical() {
                    rebinned.push((i, existing.rebinned(k, scheme)?));
                }
            }
        }
        for (i, bins) in rebinned {
            self.axes[i].set_bins(bins);
        }
        self.axes.push(axis);
        self.bins_per_axis = k;

        debug!(
            "Registered {} axis {}; {} continuous axes at {} bins each",
            domain, name, continuous, k
        );
        Ok(())
    }

    /// Pull the next sample, or `None` once every combination has been
    /// produced. Further calls after exhaustion keep returning `None`.
    pub fn next_sample(&mut self) -> HgResult<Option<Sample>> {
        if self.axes.is_empty() {
            return Err(StateError::NoAxes.into());
        }
        if !self.started {
            self.start();
        }
        if self.exhausted {
            return Ok(None);
        }

        let position = self.cursor;
        let indices = self.combination(position);
        let mut sample = Sample::with_capacity(self.axes.len());
        for (axis, &index) in self.axes.iter().zip(&indices) {
            let value = axis
                .draw(index, self.config.jitter, &mut self.rng)
                .ok_or_else(|| {
                    internal_error!("bin {} out of range for axis {}", index, axis.name())
                })?;
            sample.insert(axis.name().to_string(), value);
        }

        self.cursor += 1;
        if self.cursor >= self.total {
            self.exhausted = true;
            info!("Sample generator exhausted after {} samples", self.cursor);
        }
        Ok(Some(sample))
    }

    /// Bin index selected for each axis (registration order) at cursor
    /// `position`.
    pub fn combination(&self, position: usize) -> Vec<usize> {
        let mut indices = vec![0; self.axes.len()];
        let mut rest = position;
        for (i, axis) in self.axes.iter().enumerate().rev() {
            if axis.is_categorical() {
                indices[i] = position % axis.bin_count();
            } else {
                indices[i] = rest % axis.bin_count();
                rest /= axis.bin_count();
            }
        }
        indices
    }

    fn start(&mut self) {
        self.started = true;
        self.total = self.total_samples();
        if self.total != self.config.total_samples {
            warn!(
                "Requested {} samples; grid of {} bins over {} continuous axes yields {}",
                self.config.total_samples,
                self.bins_per_axis,
                self.continuous_count(),
                self.total
            );
        }
        info!(
            "Sampling {} combinations over {} axes (jitter {})",
            self.total,
            self.axes.len(),
            self.config.jitter
        );
        if self.total == 0 {
            self.exhausted = true;
        }
    }

    fn continuous_count(&self) -> usize {
        self.axes.iter().filter(|a| !a.is_categorical()).count()
    }

    /// Number of samples this generator will produce with the current axes.
    pub fn total_samples(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        if self.continuous_count() == 0 {
            return self.config.total_samples;
        }
        self.axes
            .iter()
            .filter(|a| !a.is_categorical())
            .fold(1usize, |acc, a| acc.saturating_mul(a.bin_count()))
    }

    pub fn bins_per_axis(&self) -> usize {
        self.bins_per_axis
    }

    pub fn produced(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.total_samples().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name() == name)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Bin of `axis` selected at cursor `position`.
    pub fn selected_bin(&self, axis: &str, position: usize) -> Option<&Bin> {
        let i = self.axes.iter().position(|a| a.name() == axis)?;
        self.axes[i].bins().get(self.combination(position)[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_types::{HgError, ParameterValue};
    use serde_json::json;
    use std::collections::HashSet;

    fn reference_generator(jitter: f64) -> SampleGenerator {
        let config = GeneratorConfig::builder(1000)
            .jitter(jitter)
            .seed(1)
            .build()
            .unwrap();
        let mut sampler = SampleGenerator::with_config(config).unwrap();
        sampler
            .set_axis("p1", AxisData::bounds(1.0, 10000.0), Domain::LogUniform, ValueType::Float)
            .unwrap();
        sampler
            .set_axis("p2", AxisData::bounds(-5.0, 5.0), Domain::Normal, ValueType::Float)
            .unwrap();
        sampler
            .set_axis("p3", AxisData::bounds(0.0, 10.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        sampler
            .set_axis(
                "p4",
                AxisData::categories([false, true]),
                Domain::Categorical,
                ValueType::Bool,
            )
            .unwrap();
        sampler
    }

    fn float(sample: &Sample, key: &str) -> f64 {
        match sample.get(key) {
            Some(ParameterValue::Float(v)) => *v,
            other => panic!("unexpected {key} value: {other:?}"),
        }
    }

    #[test]
    fn bin_count_policy_rounds_to_nearest() {
        assert_eq!(bins_per_axis(1000, 3), 10);
        assert_eq!(bins_per_axis(100, 2), 10);
        assert_eq!(bins_per_axis(50, 2), 7);
        assert_eq!(bins_per_axis(300, 3), 7);
        assert_eq!(bins_per_axis(1, 5), 1);
        assert_eq!(bins_per_axis(10, 0), 0);
    }

    #[test]
    fn reference_space_yields_exactly_the_budget() {
        let mut sampler = reference_generator(0.1);
        assert_eq!(sampler.bins_per_axis(), 10);
        assert_eq!(sampler.total_samples(), 1000);

        for _ in 0..1000 {
            let sample = sampler.next_sample().unwrap().unwrap();
            assert_eq!(sample.len(), 4);
            for key in ["p1", "p2", "p3", "p4"] {
                assert!(sample.contains_key(key));
            }
            assert!((1.0..=10000.0).contains(&float(&sample, "p1")));
            assert!((-5.0..=5.0).contains(&float(&sample, "p2")));
            assert!((0.0..=10.0).contains(&float(&sample, "p3")));
            assert!(matches!(sample.get("p4"), Some(ParameterValue::Bool(_))));
        }
        assert!(sampler.next_sample().unwrap().is_none());
        assert!(sampler.is_exhausted());
        assert_eq!(sampler.produced(), 1000);
        assert_eq!(sampler.remaining(), 0);
    }

    #[test]
    fn exhaustion_is_idempotent() {
        let mut sampler = SampleGenerator::new(4, 0.0).unwrap();
        sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        for _ in 0..4 {
            assert!(sampler.next_sample().unwrap().is_some());
        }
        for _ in 0..10 {
            assert!(sampler.next_sample().unwrap().is_none());
        }
        assert_eq!(sampler.produced(), 4);
    }

    #[test]
    fn pulling_without_axes_is_a_state_error() {
        let mut sampler = SampleGenerator::new(10, 0.0).unwrap();
        assert!(matches!(
            sampler.next_sample(),
            Err(HgError::State(StateError::NoAxes))
        ));
    }

    #[test]
    fn registering_after_sampling_is_a_state_error() {
        let mut sampler = SampleGenerator::new(10, 0.0).unwrap();
        sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        sampler.next_sample().unwrap();
        let err = sampler
            .set_axis("y", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap_err();
        assert!(matches!(err, HgError::State(StateError::SamplingStarted { .. })));
        assert_eq!(sampler.axes().len(), 1);
    }

    #[test]
    fn rejected_axes_leave_the_generator_untouched() {
        let mut sampler = SampleGenerator::new(100, 0.0).unwrap();
        sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        assert_eq!(sampler.axis("x").unwrap().bin_count(), 100);

        let dup = sampler
            .set_axis("x", AxisData::bounds(0.0, 2.0), Domain::Uniform, ValueType::Float)
            .unwrap_err();
        assert!(matches!(dup, HgError::Config(ConfigError::DuplicateAxis { .. })));

        let bad = sampler
            .set_axis("y", AxisData::bounds(3.0, 1.0), Domain::Normal, ValueType::Float)
            .unwrap_err();
        assert!(matches!(bad, HgError::Config(ConfigError::InvalidBounds { .. })));

        let log = sampler
            .set_axis("z", AxisData::bounds(-1.0, 1.0), Domain::LogUniform, ValueType::Float)
            .unwrap_err();
        assert!(matches!(log, HgError::Config(ConfigError::NonPositiveLogBound { .. })));

        let empty = sampler
            .set_axis(
                "c",
                AxisData::Categories(Vec::new()),
                Domain::Categorical,
                ValueType::Categorical,
            )
            .unwrap_err();
        assert!(matches!(empty, HgError::Config(ConfigError::EmptyCategories { .. })));

        assert_eq!(sampler.axes().len(), 1);
        assert_eq!(sampler.bins_per_axis(), 100);
        assert_eq!(sampler.axis("x").unwrap().bin_count(), 100);
    }

    #[test]
    fn oversized_budget_is_a_configuration_error() {
        let mut sampler = SampleGenerator::new(usize::MAX, 0.0).unwrap();
        let err = sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap_err();
        assert!(matches!(
            err,
            HgError::Config(ConfigError::TooManyBins { ref axis, max, .. })
                if axis == "x" && max == MAX_BINS_PER_AXIS
        ));
        assert!(sampler.axes().is_empty());

        // A budget at the cap still fits; a second axis shrinks both tables
        let mut sampler = SampleGenerator::new(1 << 20, 0.0).unwrap();
        sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        sampler
            .set_axis("y", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        assert_eq!(sampler.bins_per_axis(), 1 << 10);
    }

    #[test]
    fn adding_a_continuous_axis_rebins_the_others() {
        let mut sampler = SampleGenerator::new(100, 0.0).unwrap();
        sampler
            .set_axis("a", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        sampler
            .set_axis("b", AxisData::bounds(1.0, 100.0), Domain::LogUniform, ValueType::Float)
            .unwrap();
        assert_eq!(sampler.bins_per_axis(), 10);
        assert_eq!(sampler.axis("a").unwrap().bin_count(), 10);
        assert_eq!(sampler.axis("b").unwrap().bin_count(), 10);
        assert_eq!(sampler.total_samples(), 100);
    }

    #[test]
    fn effective_total_follows_rounded_bin_count() {
        let mut sampler = SampleGenerator::new(50, 0.0).unwrap();
        for name in ["a", "b"] {
            sampler
                .set_axis(name, AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
                .unwrap();
        }
        assert_eq!(sampler.total_samples(), 49);
        let mut count = 0;
        while sampler.next_sample().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 49);
    }

    #[test]
    fn explicit_bin_count_overrides_policy() {
        let config = GeneratorConfig::builder(1000).bins_per_axis(3).build().unwrap();
        let mut sampler = SampleGenerator::with_config(config).unwrap();
        for name in ["a", "b"] {
            sampler
                .set_axis(name, AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
                .unwrap();
        }
        assert_eq!(sampler.total_samples(), 9);
    }

    #[test]
    fn last_registered_axis_advances_fastest() {
        let mut sampler = SampleGenerator::new(4, 0.0).unwrap();
        for name in ["x", "y"] {
            sampler
                .set_axis(name, AxisData::bounds(0.0, 10.0), Domain::Uniform, ValueType::Float)
                .unwrap();
        }
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        while let Some(sample) = sampler.next_sample().unwrap() {
            xs.push(float(&sample, "x"));
            ys.push(float(&sample, "y"));
        }
        assert_eq!(xs, vec![2.5, 2.5, 7.5, 7.5]);
        assert_eq!(ys, vec![2.5, 7.5, 2.5, 7.5]);
    }

    #[test]
    fn categorical_axes_cycle_round_robin() {
        let mut sampler = SampleGenerator::new(9, 0.0).unwrap();
        sampler
            .set_axis("x", AxisData::bounds(0.0, 1.0), Domain::Uniform, ValueType::Float)
            .unwrap();
        sampler
            .set_axis(
                "act",
                AxisData::categories(["relu", "tanh", "gelu", "silu"]),
                Domain::Categorical,
                ValueType::Categorical,
            )
            .unwrap();
        assert_eq!(sampler.total_samples(), 9);

        let labels = ["relu", "tanh", "gelu", "silu"];
        for i in 0..9 {
            let sample = sampler.next_sample().unwrap().unwrap();
            assert_eq!(
                sample.get("act"),
                Some(&ParameterValue::Json(json!(labels[i % 4])))
            );
        }
        assert!(sampler.next_sample().unwrap().is_none());
    }

    #[test]
    fn categorical_only_space_uses_requested_count() {
        let mut sampler = SampleGenerator::new(5, 0.0).unwrap();
        sampler
            .set_axis(
                "flag",
                AxisData::categories([true, false]),
                Domain::Categorical,
                ValueType::Bool,
            )
            .unwrap();
        assert_eq!(sampler.bins_per_axis(), 0);
        let mut flags = Vec::new();
        while let Some(sample) = sampler.next_sample().unwrap() {
            flags.push(sample["flag"].as_bool().unwrap());
        }
        assert_eq!(flags, vec![true, false, true, false, true]);
    }

    #[test]
    fn combinations_never_repeat() {
        let mut sampler = reference_generator(0.0);
        let mut seen = HashSet::new();
        while let Some(sample) = sampler.next_sample().unwrap() {
            let key = (
                float(&sample, "p1").to_bits(),
                float(&sample, "p2").to_bits(),
                float(&sample, "p3").to_bits(),
            );
            assert!(seen.insert(key), "combination repeated: {key:?}");
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn jitter_never_leaves_the_selected_bin() {
        for jitter in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let mut sampler = reference_generator(jitter);
            let mut position = 0;
            while let Some(sample) = sampler.next_sample().unwrap() {
                for key in ["p1", "p2", "p3"] {
                    let bin = sampler.selected_bin(key, position).unwrap();
                    let value = float(&sample, key);
                    assert!(bin.contains(value), "{key}={value} outside {bin:?}");
                }
                position += 1;
            }
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let mut a = reference_generator(0.0);
        let mut b = SampleGenerator::new(1000, 0.0).unwrap();
        for axis in a.axes().to_vec() {
            b.set_axis(axis.name(), axis.data().clone(), axis.domain(), axis.value_type())
                .unwrap();
        }
        loop {
            let (x, y) = (a.next_sample().unwrap(), b.next_sample().unwrap());
            assert_eq!(x, y);
            if x.is_none() {
                break;
            }
        }
    }

    #[test]
    fn fixed_seed_reproduces_jittered_stream() {
        let mut a = reference_generator(0.5);
        let mut b = reference_generator(0.5);
        for _ in 0..1000 {
            assert_eq!(a.next_sample().unwrap(), b.next_sample().unwrap());
        }
    }

    #[test]
    fn value_types_are_applied() {
        let mut sampler = SampleGenerator::new(8, 1.0).unwrap();
        sampler
            .set_axis("layers", AxisData::bounds(1.0, 16.0), Domain::Uniform, ValueType::Int)
            .unwrap();
        while let Some(sample) = sampler.next_sample().unwrap() {
            let layers = sample["layers"].as_i64().unwrap();
            assert!((1..=16).contains(&layers));
        }
    }
}
