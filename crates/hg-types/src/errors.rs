use thiserror::Error;

/// Main error type for the HyperGrid system
#[derive(Error, Debug)]
pub enum HgError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Numerical error: {0}")]
    Numerical(#[from] NumericalError),

    #[error("Objective error: {0}")]
    Objective(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while describing axes or configuring a generator.
///
/// These are always reported at registration/construction time, never while
/// samples are being drawn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Duplicate axis name: {name}")]
    DuplicateAxis { name: String },

    #[error("Unsupported domain: {domain}")]
    UnsupportedDomain { domain: String },

    #[error("Unsupported value type: {value_type}")]
    UnsupportedValueType { value_type: String },

    #[error("Invalid bounds for axis {axis}: lower {lo} must be finite and below upper {hi}")]
    InvalidBounds { axis: String, lo: f64, hi: f64 },

    #[error("Log-uniform axis {axis} requires a positive lower bound, got {lo}")]
    NonPositiveLogBound { axis: String, lo: f64 },

    #[error("Categorical axis {axis} has no categories")]
    EmptyCategories { axis: String },

    #[error("Axis {axis}: value {value} cannot be represented as {value_type}")]
    IncompatibleValue {
        axis: String,
        value: String,
        value_type: String,
    },

    #[error("Axis {axis}: malformed data: {message}")]
    MalformedData { axis: String, message: String },

    #[error("Axis {axis}: bin count must be at least 1")]
    ZeroBins { axis: String },

    #[error("Axis {axis}: {bins} bins exceeds the per-axis maximum of {max}")]
    TooManyBins { axis: String, bins: usize, max: usize },

    #[error("Integer axis {axis}: [{lo}, {hi}] contains no integer")]
    NoIntegerInRange { axis: String, lo: f64, hi: f64 },

    #[error("Total sample count must be at least 1")]
    ZeroSamples,

    #[error("Jitter fraction {value} is outside [0, 1]")]
    InvalidJitter { value: f64 },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors raised when an operation is called in the wrong lifecycle phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("No axes registered; register at least one axis before sampling")]
    NoAxes,

    #[error("Cannot register axis {name}: sampling has already begun")]
    SamplingStarted { name: String },
}

/// Errors raised when boundary computation leaves the finite range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalError {
    #[error("Axis {axis}: boundary {index} is not finite ({value}); bounds too extreme for a stable partition")]
    NonFiniteBoundary {
        axis: String,
        index: usize,
        value: f64,
    },

    #[error("Axis {axis}: bin {index} collapsed to zero width at {value}; bounds too narrow for the bin count")]
    DegenerateBin {
        axis: String,
        index: usize,
        value: f64,
    },
}

/// Result type alias for HyperGrid operations
pub type HgResult<T> = Result<T, HgError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::HgError::Config($crate::ConfigError::Invalid {
            message: format!($($arg)*),
        })
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::HgError::Internal(format!($($arg)*))
    };
}
