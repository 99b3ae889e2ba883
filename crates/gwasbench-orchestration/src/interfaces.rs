//! Orchestration interfaces.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use gwasbench_core::error::BenchError;

/// The strictly ordered steps of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStep {
    ExportProjections,
    StageProjections,
    StartCoordination,
    AwaitCoordination,
    StartProvider,
    RunCompute,
    CollectResult,
}

impl RunStep {
    /// All steps in execution order.
    pub const ALL: [RunStep; 7] = [
        RunStep::ExportProjections,
        RunStep::StageProjections,
        RunStep::StartCoordination,
        RunStep::AwaitCoordination,
        RunStep::StartProvider,
        RunStep::RunCompute,
        RunStep::CollectResult,
    ];

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ExportProjections => "export projections",
            Self::StageProjections => "stage projections",
            Self::StartCoordination => "start coordination server",
            Self::AwaitCoordination => "await coordination server",
            Self::StartProvider => "start provider",
            Self::RunCompute => "run compute node",
            Self::CollectResult => "collect result",
        }
    }
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trait for reporting step progress to the user.
pub trait RunObserver: Send + Sync {
    /// A step is about to start.
    fn on_step_started(&self, step: RunStep);

    /// A step completed.
    fn on_step_finished(&self, step: RunStep, elapsed: Duration);

    /// A step failed; the run stops after this call.
    fn on_step_failed(&self, step: RunStep, error: &BenchError);
}

/// Observer that ignores every event.
pub struct NoOpObserver;

impl RunObserver for NoOpObserver {
    fn on_step_started(&self, _step: RunStep) {}
    fn on_step_finished(&self, _step: RunStep, _elapsed: Duration) {}
    fn on_step_failed(&self, _step: RunStep, _error: &BenchError) {}
}

/// Wall-clock duration of one completed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTiming {
    pub step: RunStep,
    pub elapsed: Duration,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepTiming>,
    /// Where the result was relocated to.
    pub result_path: PathBuf,
    pub total: Duration,
}

impl RunReport {
    /// Duration of `step`, if it ran.
    #[must_use]
    pub fn elapsed(&self, step: RunStep) -> Option<Duration> {
        self.steps.iter().find(|t| t.step == step).map(|t| t.elapsed)
    }

    /// The benchmark measurement: how long the compute node ran.
    #[must_use]
    pub fn compute_time(&self) -> Option<Duration> {
        self.elapsed(RunStep::RunCompute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer() {
        let observer = NoOpObserver;
        observer.on_step_started(RunStep::RunCompute);
        observer.on_step_finished(RunStep::RunCompute, Duration::from_millis(3));
        observer.on_step_failed(RunStep::RunCompute, &BenchError::Cancelled);
    }

    #[test]
    fn report_lookup() {
        let report = RunReport {
            steps: vec![
                StepTiming {
                    step: RunStep::StartCoordination,
                    elapsed: Duration::from_millis(2),
                },
                StepTiming {
                    step: RunStep::RunCompute,
                    elapsed: Duration::from_secs(4),
                },
            ],
            result_path: PathBuf::from("SECRET_results.vcf"),
            total: Duration::from_secs(5),
        };
        assert_eq!(report.compute_time(), Some(Duration::from_secs(4)));
        assert_eq!(report.elapsed(RunStep::ExportProjections), None);
    }

    #[test]
    fn steps_are_ordered() {
        assert_eq!(RunStep::ALL[0], RunStep::ExportProjections);
        assert_eq!(RunStep::ALL[6], RunStep::CollectResult);
        assert_eq!(RunStep::RunCompute.to_string(), "run compute node");
    }
}
