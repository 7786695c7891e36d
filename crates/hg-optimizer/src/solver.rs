//! The consumer loop: pull every sample, evaluate it, keep the best.

use std::fmt;
use std::time::{Duration, Instant};

use hg_types::{HgError, HgResult, Sample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::project::ProjectFile;
use crate::search::QuasiRandomSearch;
use crate::trial::{OptimizationConfig, OptimizationStatus, Trial, TrialResult, TrialStatus};

/// An objective to be minimized.
pub trait Blackbox {
    fn evaluate(&mut self, sample: &Sample) -> HgResult<f64>;
}

impl<F> Blackbox for F
where
    F: FnMut(&Sample) -> f64,
{
    fn evaluate(&mut self, sample: &Sample) -> HgResult<f64> {
        Ok(self(sample))
    }
}

/// Adapter for objectives that can fail.
pub struct Fallible<F>(pub F);

impl<F> Blackbox for Fallible<F>
where
    F: FnMut(&Sample) -> HgResult<f64>,
{
    fn evaluate(&mut self, sample: &Sample) -> HgResult<f64> {
        (self.0)(sample)
    }
}

/// Runs a [`Blackbox`] over the quasi-random sample stream of a search space.
#[derive(Debug, Clone)]
pub struct QuasiRandomSolver {
    config: OptimizationConfig,
}

impl QuasiRandomSolver {
    pub fn new(config: OptimizationConfig) -> Self {
        Self { config }
    }

    pub fn from_project(project: ProjectFile, name: impl Into<String>) -> HgResult<Self> {
        Ok(Self::new(project.into_config(name)?))
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Evaluate samples until the stream is exhausted or `max_iterations`
    /// trials have run. A failing objective marks its trial failed and the
    /// loop moves on; generator errors abort the run.
    pub fn run<B: Blackbox + ?Sized>(&self, blackbox: &mut B) -> HgResult<SolverReport> {
        let config = &self.config;
        let mut search = QuasiRandomSearch::new(&config.search_space, config.generator_config()?)?;
        let mut status = OptimizationStatus::new(config);
        let mut trials = Vec::new();
        let mut blackbox_duration = Duration::ZERO;

        info!(
            run = %config.name,
            id = %config.id,
            max_iterations = config.max_iterations,
            "starting quasi-random run"
        );
        status.mark_running();
        let started = Instant::now();

        while trials.len() < config.max_iterations {
            let sample = match search.next_sample()? {
                Some(sample) => sample,
                None => break,
            };
            let mut trial = Trial::new(config.id, trials.len(), sample);
            trial.mark_running();

            let t0 = Instant::now();
            let outcome = blackbox.evaluate(&trial.parameters);
            let elapsed = t0.elapsed();
            blackbox_duration += elapsed;

            match outcome {
                Ok(loss) if !loss.is_nan() => {
                    debug!(trial = trial.trial_number, loss, "trial completed");
                    trial.mark_completed(loss, elapsed);
                }
                Ok(loss) => {
                    warn!(trial = trial.trial_number, "objective returned {loss}");
                    let error = HgError::Objective(format!("non-numeric loss {loss}"));
                    trial.mark_failed(error.to_string());
                }
                Err(e) => {
                    warn!(trial = trial.trial_number, error = %e, "objective failed");
                    trial.mark_failed(e.to_string());
                }
            }
            status.record(&trial);
            trials.push(trial);
        }

        if search.generator().remaining() > 0 {
            info!(
                remaining = search.generator().remaining(),
                "iteration budget reached before the sample stream was exhausted"
            );
        }
        status.mark_completed();

        let report = SolverReport {
            status,
            trials,
            total_duration: started.elapsed(),
            blackbox_duration,
        };
        info!(
            trials = report.trials.len(),
            failed = report.status.trials_failed,
            best_loss = report.best().map(|b| b.loss),
            "quasi-random run finished"
        );
        Ok(report)
    }
}

/// One row of [`SolverReport::results`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub trial_number: usize,
    pub status: TrialStatus,
    pub duration_seconds: Option<f64>,
    pub loss: Option<f64>,
    pub parameters: Sample,
}

/// Everything a finished run produced, plus its timing statistics.
#[derive(Debug, Clone)]
pub struct SolverReport {
    status: OptimizationStatus,
    trials: Vec<Trial>,
    total_duration: Duration,
    blackbox_duration: Duration,
}

impl SolverReport {
    pub fn status(&self) -> &OptimizationStatus {
        &self.status
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn best(&self) -> Option<&TrialResult> {
        self.status.best_trial.as_ref()
    }

    pub fn best_parameters(&self) -> Option<&Sample> {
        self.best().map(|b| &b.parameters)
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Time spent inside the objective, summed over trials.
    pub fn blackbox_duration(&self) -> Duration {
        self.blackbox_duration
    }

    pub fn time_per_iteration(&self) -> Duration {
        match u32::try_from(self.trials.len()) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_duration / n,
            Err(_) => self.total_duration.div_f64(self.trials.len() as f64),
        }
    }

    /// Share of wall-clock time not spent in the objective, in percent.
    pub fn overhead_percent(&self) -> f64 {
        let total = self.total_duration.as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }
        let overhead = self.total_duration.saturating_sub(self.blackbox_duration);
        100.0 * overhead.as_secs_f64() / total
    }

    pub fn results(&self) -> Vec<ResultRow> {
        self.trials
            .iter()
            .map(|trial| ResultRow {
                trial_number: trial.trial_number,
                status: trial.status,
                duration_seconds: trial.result.as_ref().map(|r| r.duration_seconds),
                loss: trial.loss(),
                parameters: trial.parameters.clone(),
            })
            .collect()
    }
}

impl fmt::Display for SolverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trials: {} ({} failed)", self.trials.len(), self.status.trials_failed)?;
        writeln!(f, "total duration: {:.3?}", self.total_duration)?;
        writeln!(f, "time per iteration: {:.3?}", self.time_per_iteration())?;
        writeln!(f, "blackbox duration: {:.3?}", self.blackbox_duration)?;
        writeln!(f, "solver overhead: {:.1}%", self.overhead_percent())?;
        match self.best() {
            Some(best) => {
                writeln!(f, "best loss: {} (trial {})", best.loss, best.trial_number)?;
                let mut names: Vec<_> = best.parameters.keys().collect();
                names.sort();
                for name in names {
                    writeln!(f, " - {name}: {}", best.parameters[name.as_str()])?;
                }
                Ok(())
            }
            None => writeln!(f, "best loss: none"),
        }
    }
}
