//! # hg-optimizer
//!
//! Search space descriptions, JSON project loading, trial tracking and the
//! quasi-random solver loop built on top of `hg-sampler`.

mod project;
mod search;
mod solver;
mod trial;

pub use project::{AxisSpec, ProjectFile};
pub use search::{ParameterDef, QuasiRandomSearch, SearchSpace, SearchStrategy};
pub use solver::{Blackbox, Fallible, QuasiRandomSolver, ResultRow, SolverReport};
pub use trial::{
    OptimizationConfig, OptimizationId, OptimizationState, OptimizationStatus,
    Trial, TrialResult, TrialStatus, DEFAULT_MAX_ITERATIONS,
};
