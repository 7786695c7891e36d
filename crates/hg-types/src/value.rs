use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Distributional shape assumed for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Linear-uniform over `[lo, hi]`.
    Uniform,
    /// Uniform in log space over `[lo, hi]`, `lo > 0`.
    LogUniform,
    /// Bell-weighted over `[lo, hi]`, mean at the midpoint.
    Normal,
    /// A finite list of literal values.
    Categorical,
}

impl Domain {
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Self::Categorical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::LogUniform => "loguniform",
            Self::Normal => "normal",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "loguniform" => Ok(Self::LogUniform),
            "normal" => Ok(Self::Normal),
            "categorical" => Ok(Self::Categorical),
            _ => Err(ConfigError::UnsupportedDomain {
                domain: s.to_string(),
            }),
        }
    }
}

/// Concrete type a sampled value is converted to before it enters a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Float,
    Int,
    Bool,
    #[serde(alias = "str")]
    Categorical,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Categorical => "categorical",
        }
    }

    /// Convert a numeric draw from a continuous axis.
    ///
    /// `Int` rounds to nearest, `Bool` is true for any value that does not
    /// round to zero. `Categorical` keeps the number as a JSON literal.
    ///
    /// Rounding is not clamped to the axis bounds: a draw near a fractional
    /// bound can land on the integer just outside it (`0.3` on `[0.2, 3.4]`
    /// gives `0`). Integer axes whose bounds enclose no integer are rejected
    /// when the axis is registered.
    pub fn cast(&self, value: f64) -> ParameterValue {
        match self {
            Self::Float => ParameterValue::Float(value),
            Self::Int => ParameterValue::Int(value.round() as i64),
            Self::Bool => ParameterValue::Bool(value.round() != 0.0),
            Self::Categorical => serde_json::Number::from_f64(value)
                .map(|n| ParameterValue::Json(serde_json::Value::Number(n)))
                .unwrap_or(ParameterValue::Float(value)),
        }
    }

    /// Convert a categorical literal, or `None` if it has no representation
    /// in this type.
    pub fn convert_literal(&self, literal: &serde_json::Value) -> Option<ParameterValue> {
        use serde_json::Value;

        match (self, literal) {
            (Self::Categorical, v) => Some(ParameterValue::Json(v.clone())),
            (Self::Float, Value::Number(n)) => n.as_f64().map(ParameterValue::Float),
            (Self::Float, Value::Bool(b)) => Some(ParameterValue::Float(f64::from(u8::from(*b)))),
            (Self::Int, Value::Number(n)) => match n.as_i64() {
                Some(i) => Some(ParameterValue::Int(i)),
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| ParameterValue::Int(f.round() as i64)),
            },
            (Self::Int, Value::Bool(b)) => Some(ParameterValue::Int(i64::from(*b))),
            (Self::Bool, Value::Bool(b)) => Some(ParameterValue::Bool(*b)),
            (Self::Bool, Value::Number(n)) => n.as_f64().map(|f| ParameterValue::Bool(f != 0.0)),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" => Ok(Self::Float),
            "int" => Ok(Self::Int),
            "bool" => Ok(Self::Bool),
            "categorical" | "str" => Ok(Self::Categorical),
            _ => Err(ConfigError::UnsupportedValueType {
                value_type: s.to_string(),
            }),
        }
    }
}

/// A concrete parameter value placed into a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl ParameterValue {
    /// Numeric view of the value; booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(v) => Some(f64::from(u8::from(*v))),
            Self::Json(v) => v.as_f64(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// One point of the search space: axis name to concrete value.
pub type Sample = HashMap<String, ParameterValue>;
