//! Axis and bin model.

use hg_types::{ConfigError, Domain, HgError, HgResult, ParameterValue, ValueType};
use rand::distr::Open01;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::partition::{partitioner_for, NormalScheme};

/// One sub-interval of a continuous axis, or one literal of a categorical axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Bin {
    Interval { lower: f64, upper: f64 },
    Literal(ParameterValue),
}

impl Bin {
    pub fn midpoint(&self) -> Option<f64> {
        match self {
            Self::Interval { lower, upper } => Some(lower + (upper - lower) / 2.0),
            Self::Literal(_) => None,
        }
    }

    pub fn width(&self) -> Option<f64> {
        match self {
            Self::Interval { lower, upper } => Some(upper - lower),
            Self::Literal(_) => None,
        }
    }

    /// Whether `value` lies inside the closed interval. Always false for literals.
    pub fn contains(&self, value: f64) -> bool {
        match self {
            Self::Interval { lower, upper } => *lower <= value && value <= *upper,
            Self::Literal(_) => false,
        }
    }
}

/// Raw axis description: numeric bounds or an ordered list of literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisData {
    Bounds { lo: f64, hi: f64 },
    Categories(Vec<serde_json::Value>),
}

impl AxisData {
    pub fn bounds(lo: f64, hi: f64) -> Self {
        Self::Bounds { lo, hi }
    }

    pub fn categories<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        Self::Categories(values.into_iter().map(Into::into).collect())
    }

    /// Interpret a JSON `data` entry for the given domain: `[lo, hi]` for
    /// continuous domains, a list of literals for categorical ones.
    pub fn from_json(axis: &str, domain: Domain, data: &serde_json::Value) -> HgResult<Self> {
        let malformed = |message: String| ConfigError::MalformedData {
            axis: axis.to_string(),
            message,
        };
        let items = data
            .as_array()
            .ok_or_else(|| malformed(format!("expected a list, got {data}")))?;

        if !domain.is_continuous() {
            return Ok(Self::Categories(items.clone()));
        }
        match items.as_slice() {
            [lo, hi] => {
                let lo = lo
                    .as_f64()
                    .ok_or_else(|| malformed(format!("lower bound {lo} is not a number")))?;
                let hi = hi
                    .as_f64()
                    .ok_or_else(|| malformed(format!("upper bound {hi} is not a number")))?;
                Ok(Self::Bounds { lo, hi })
            }
            _ => Err(malformed(format!(
                "{domain} axis expects [lo, hi], got {} entries",
                items.len()
            ))
            .into()),
        }
    }
}

/// A named, partitioned dimension of the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    name: String,
    domain: Domain,
    data: AxisData,
    value_type: ValueType,
    bins: Vec<Bin>,
}

impl Axis {
    /// Validate the description and compute its bins. `n_bins` is ignored
    /// for categorical axes, which get one bin per literal.
    pub(crate) fn new(
        name: &str,
        data: AxisData,
        domain: Domain,
        value_type: ValueType,
        n_bins: usize,
        scheme: NormalScheme,
    ) -> HgResult<Self> {
        let bins = build_bins(name, &data, domain, value_type, n_bins, scheme)?;
        Ok(Self {
            name: name.to_string(),
            domain,
            data,
            value_type,
            bins,
        })
    }

    /// Bins this axis would have at another bin count; `self` is untouched.
    pub(crate) fn rebinned(&self, n_bins: usize, scheme: NormalScheme) -> HgResult<Vec<Bin>> {
        build_bins(
            &self.name,
            &self.data,
            self.domain,
            self.value_type,
            n_bins,
            scheme,
        )
    }

    pub(crate) fn set_bins(&mut self, bins: Vec<Bin>) {
        self.bins = bins;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn data(&self) -> &AxisData {
        &self.data
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn is_categorical(&self) -> bool {
        !self.domain.is_continuous()
    }

    /// Numeric draw inside interval bin `index`: the midpoint displaced by up
    /// to `±jitter × width / 2`. `None` for literals or out-of-range indices.
    pub(crate) fn point<R: Rng>(&self, index: usize, jitter: f64, rng: &mut R) -> Option<f64> {
        match self.bins.get(index)? {
            Bin::Interval { lower, upper } => {
                let half = (upper - lower) / 2.0;
                let mid = lower + half;
                if jitter > 0.0 {
                    let unit: f64 = rng.sample(Open01);
                    Some((mid + jitter * half * (2.0 * unit - 1.0)).clamp(*lower, *upper))
                } else {
                    Some(mid)
                }
            }
            Bin::Literal(_) => None,
        }
    }

    /// Typed value for bin `index`: a converted [`Axis::point`] for intervals,
    /// the literal itself for categorical bins.
    pub(crate) fn draw<R: Rng>(
        &self,
        index: usize,
        jitter: f64,
        rng: &mut R,
    ) -> Option<ParameterValue> {
        match self.bins.get(index)? {
            Bin::Interval { .. } => self
                .point(index, jitter, rng)
                .map(|raw| self.value_type.cast(raw)),
            Bin::Literal(value) => Some(value.clone()),
        }
    }
}

fn build_bins(
    name: &str,
    data: &AxisData,
    domain: Domain,
    value_type: ValueType,
    n_bins: usize,
    scheme: NormalScheme,
) -> HgResult<Vec<Bin>> {
    let malformed = |message: &str| ConfigError::MalformedData {
        axis: name.to_string(),
        message: message.to_string(),
    };

    match (partitioner_for(domain, scheme), data) {
        (Some(partitioner), AxisData::Bounds { lo, hi }) => {
            let boundaries = partitioner
                .boundaries(*lo, *hi, n_bins)
                .map_err(|e| e.for_axis(name))?;
            if value_type == ValueType::Int && lo.ceil() > hi.floor() {
                return Err(ConfigError::NoIntegerInRange {
                    axis: name.to_string(),
                    lo: *lo,
                    hi: *hi,
                }
                .into());
            }
            Ok(boundaries
                .windows(2)
                .map(|w| Bin::Interval {
                    lower: w[0],
                    upper: w[1],
                })
                .collect())
        }
        (None, AxisData::Categories(values)) => {
            if values.is_empty() {
                return Err(ConfigError::EmptyCategories {
                    axis: name.to_string(),
                }
                .into());
            }
            values
                .iter()
                .map(|v| {
                    value_type
                        .convert_literal(v)
                        .map(Bin::Literal)
                        .ok_or_else(|| {
                            HgError::from(ConfigError::IncompatibleValue {
                                axis: name.to_string(),
                                value: v.to_string(),
                                value_type: value_type.to_string(),
                            })
                        })
                })
                .collect()
        }
        (Some(_), AxisData::Categories(_)) => {
            Err(malformed(&format!("{domain} axis requires numeric bounds, got a category list")).into())
        }
        (None, AxisData::Bounds { .. }) => {
            Err(malformed("categorical axis requires a list of values, got bounds").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn uniform_axis(n: usize) -> Axis {
        Axis::new(
            "x",
            AxisData::bounds(0.0, 10.0),
            Domain::Uniform,
            ValueType::Float,
            n,
            NormalScheme::default(),
        )
        .unwrap()
    }

    #[test]
    fn continuous_axis_bins_cover_bounds() {
        let axis = uniform_axis(5);
        assert_eq!(axis.bin_count(), 5);
        assert_eq!(
            axis.bins()[0],
            Bin::Interval {
                lower: 0.0,
                upper: 2.0
            }
        );
        assert_eq!(axis.bins()[4].midpoint(), Some(9.0));
        assert!(!axis.is_categorical());
    }

    #[test]
    fn categorical_axis_keeps_literal_order() {
        let axis = Axis::new(
            "act",
            AxisData::categories(["relu", "tanh", "gelu"]),
            Domain::Categorical,
            ValueType::Categorical,
            99,
            NormalScheme::default(),
        )
        .unwrap();
        assert_eq!(axis.bin_count(), 3);
        assert_eq!(axis.bins()[1], Bin::Literal(ParameterValue::Json(json!("tanh"))));
    }

    #[test]
    fn categorical_literals_must_fit_the_value_type() {
        let err = Axis::new(
            "flag",
            AxisData::categories([json!(true), json!("maybe")]),
            Domain::Categorical,
            ValueType::Bool,
            1,
            NormalScheme::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HgError::Config(ConfigError::IncompatibleValue { ref axis, .. }) if axis == "flag"
        ));
    }

    #[test]
    fn int_axis_needs_an_integer_inside_its_bounds() {
        let err = Axis::new(
            "n",
            AxisData::bounds(0.2, 0.9),
            Domain::Uniform,
            ValueType::Int,
            4,
            NormalScheme::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HgError::Config(ConfigError::NoIntegerInRange { ref axis, .. }) if axis == "n"
        ));

        let axis = Axis::new(
            "n",
            AxisData::bounds(0.2, 1.0),
            Domain::Uniform,
            ValueType::Int,
            4,
            NormalScheme::default(),
        )
        .unwrap();
        assert_eq!(axis.bin_count(), 4);
    }

    #[test]
    fn empty_categories_are_rejected() {
        let err = Axis::new(
            "c",
            AxisData::Categories(Vec::new()),
            Domain::Categorical,
            ValueType::Categorical,
            1,
            NormalScheme::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HgError::Config(ConfigError::EmptyCategories { .. })));
    }

    #[test]
    fn data_shape_must_match_domain() {
        let err = Axis::new(
            "c",
            AxisData::bounds(0.0, 1.0),
            Domain::Categorical,
            ValueType::Float,
            1,
            NormalScheme::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HgError::Config(ConfigError::MalformedData { .. })));

        let err = Axis::new(
            "u",
            AxisData::categories([1, 2]),
            Domain::Uniform,
            ValueType::Float,
            1,
            NormalScheme::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HgError::Config(ConfigError::MalformedData { .. })));
    }

    #[test]
    fn partition_errors_carry_the_axis_name() {
        let err = Axis::new(
            "lr",
            AxisData::bounds(0.0, 1.0),
            Domain::LogUniform,
            ValueType::Float,
            4,
            NormalScheme::default(),
        )
        .unwrap_err();
        match err {
            HgError::Config(ConfigError::NonPositiveLogBound { axis, lo }) => {
                assert_eq!(axis, "lr");
                assert_eq!(lo, 0.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn draw_without_jitter_returns_midpoint() {
        let axis = uniform_axis(10);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(axis.point(3, 0.0, &mut rng), Some(3.5));
        assert_eq!(axis.draw(3, 0.0, &mut rng), Some(ParameterValue::Float(3.5)));
        assert!(axis.draw(10, 0.0, &mut rng).is_none());
    }

    #[test]
    fn jittered_draw_stays_in_bin() {
        let axis = uniform_axis(4);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for jitter in [0.1, 0.5, 1.0] {
            for _ in 0..500 {
                for (i, bin) in axis.bins().iter().enumerate() {
                    let raw = axis.point(i, jitter, &mut rng).unwrap();
                    assert!(bin.contains(raw), "{raw} escaped {bin:?}");
                    let mid = bin.midpoint().unwrap();
                    assert!((raw - mid).abs() <= jitter * bin.width().unwrap() / 2.0 + 1e-12);
                }
            }
        }
    }

    #[test]
    fn int_axis_rounds_draws() {
        let axis = Axis::new(
            "layers",
            AxisData::bounds(1.0, 9.0),
            Domain::Uniform,
            ValueType::Int,
            4,
            NormalScheme::default(),
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(axis.draw(0, 0.0, &mut rng), Some(ParameterValue::Int(2)));
    }

    #[test]
    fn axis_data_from_json() {
        let bounds = AxisData::from_json("x", Domain::Normal, &json!([-5, 5])).unwrap();
        assert_eq!(bounds, AxisData::bounds(-5.0, 5.0));

        let cats = AxisData::from_json("c", Domain::Categorical, &json!([false, true])).unwrap();
        assert_eq!(cats, AxisData::categories([false, true]));

        assert!(AxisData::from_json("x", Domain::Uniform, &json!([1, 2, 3])).is_err());
        assert!(AxisData::from_json("x", Domain::Uniform, &json!(["a", 2])).is_err());
        assert!(AxisData::from_json("x", Domain::Uniform, &json!(3)).is_err());
    }
}
