//! Trial tracking and optimization run management.

use chrono::{DateTime, Utc};
use hg_sampler::{GeneratorConfig, NormalScheme};
use hg_types::{HgResult, Sample};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::search::SearchSpace;

/// Unique optimization run identifier.
pub type OptimizationId = Uuid;

/// Default sample budget when a project does not name one.
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub id: OptimizationId,
    pub name: String,

    /// The parameter search space.
    pub search_space: SearchSpace,

    /// Sample budget. Doubles as the generator's requested sample count and
    /// as a hard cap on the number of evaluated trials.
    pub max_iterations: usize,

    pub jitter: f64,
    pub seed: Option<u64>,
    pub bins_per_axis: Option<usize>,
    pub normal_scheme: NormalScheme,

    pub created_at: DateTime<Utc>,
}

impl OptimizationConfig {
    pub fn new(name: impl Into<String>, search_space: SearchSpace) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            search_space,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            jitter: 0.0,
            seed: None,
            bins_per_axis: None,
            normal_scheme: NormalScheme::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_bins_per_axis(mut self, bins: usize) -> Self {
        self.bins_per_axis = Some(bins);
        self
    }

    pub fn with_normal_scheme(mut self, scheme: NormalScheme) -> Self {
        self.normal_scheme = scheme;
        self
    }

    /// Validated generator settings derived from this run.
    pub fn generator_config(&self) -> HgResult<GeneratorConfig> {
        let mut builder = GeneratorConfig::builder(self.max_iterations)
            .jitter(self.jitter)
            .normal_scheme(self.normal_scheme);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some(bins) = self.bins_per_axis {
            builder = builder.bins_per_axis(bins);
        }
        builder.build()
    }
}

/// Lifecycle state for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationState {
    Pending,
    Running,
    Completed,
}

/// Aggregate status of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStatus {
    pub id: OptimizationId,
    pub state: OptimizationState,
    pub trials_completed: usize,
    pub trials_failed: usize,
    pub best_trial: Option<TrialResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OptimizationStatus {
    pub fn new(config: &OptimizationConfig) -> Self {
        Self {
            id: config.id,
            state: OptimizationState::Pending,
            trials_completed: 0,
            trials_failed: 0,
            best_trial: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = OptimizationState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = OptimizationState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn trials_finished(&self) -> usize {
        self.trials_completed + self.trials_failed
    }

    /// Record a finished trial, keeping the lowest loss seen so far.
    /// Ties keep the earlier result.
    pub fn record(&mut self, trial: &Trial) {
        match &trial.result {
            Some(result) => {
                self.trials_completed += 1;
                self.update_best(result);
            }
            None => self.trials_failed += 1,
        }
    }

    pub fn update_best(&mut self, result: &TrialResult) {
        if result.loss.is_nan() {
            return;
        }
        let improves = match &self.best_trial {
            None => true,
            Some(best) => result.loss < best.loss,
        };
        if improves {
            self.best_trial = Some(result.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// One sample evaluated by the objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub optimization_id: OptimizationId,
    pub trial_number: usize,
    pub parameters: Sample,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(optimization_id: OptimizationId, trial_number: usize, parameters: Sample) -> Self {
        Self {
            id: Uuid::new_v4(),
            optimization_id,
            trial_number,
            parameters,
            status: TrialStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, loss: f64, duration: Duration) {
        self.status = TrialStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(TrialResult {
            trial_id: self.id,
            trial_number: self.trial_number,
            loss,
            parameters: self.parameters.clone(),
            duration_seconds: duration.as_secs_f64(),
        });
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    pub fn loss(&self) -> Option<f64> {
        self.result.as_ref().map(|r| r.loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of a completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    pub trial_number: usize,
    pub loss: f64,
    pub parameters: Sample,
    /// Wall-clock time spent inside the objective.
    pub duration_seconds: f64,
}
