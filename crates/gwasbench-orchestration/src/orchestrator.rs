//! Sequencing of one benchmark run.

use std::time::{Duration, Instant};

use gwasbench_core::cancel::CancellationToken;
use gwasbench_core::error::BenchError;

use crate::interfaces::{RunObserver, RunReport, RunStep, StepTiming};
use crate::plan::RunPlan;
use crate::process::ServiceProcess;
use crate::staging;

/// Runs the strictly ordered steps of a [`RunPlan`].
///
/// Background services are owned for the duration of [`run`](Self::run)
/// and terminated in reverse start order on every exit path.
pub struct Orchestrator<'a> {
    plan: RunPlan,
    cancel: CancellationToken,
    observer: &'a dyn RunObserver,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(plan: RunPlan, cancel: CancellationToken, observer: &'a dyn RunObserver) -> Self {
        Self {
            plan,
            cancel,
            observer,
        }
    }

    /// Execute the run and return per-step timings.
    pub fn run(&self) -> Result<RunReport, BenchError> {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(RunStep::ALL.len());
        let mut services = Vec::new();

        let outcome = self.run_steps(&mut steps, &mut services);

        while let Some(mut service) = services.pop() {
            service.terminate();
        }

        let result_path = outcome?;
        let report = RunReport {
            steps,
            result_path,
            total: start.elapsed(),
        };
        tracing::info!(
            total = ?report.total,
            compute = ?report.compute_time(),
            result = %report.result_path.display(),
            "run complete"
        );
        Ok(report)
    }

    fn run_steps(
        &self,
        steps: &mut Vec<StepTiming>,
        services: &mut Vec<ServiceProcess>,
    ) -> Result<std::path::PathBuf, BenchError> {
        let plan = &self.plan;
        // Resolve the probe first so a bad compute config fails before anything starts.
        let probe = plan.readiness_probe()?;
        let staging_dir = plan.resolve(&plan.staging_dir);

        self.step(steps, RunStep::ExportProjections, || {
            if let Some(exporter) = &plan.exporter {
                let log_dir = plan.exporter_log_dir();
                staging::run_exporter(exporter, &staging_dir, log_dir.as_deref(), &self.cancel)?;
            }
            staging::locate_projections(&staging_dir, &plan.projections).map(|_| ())
        })?;

        self.step(steps, RunStep::StageProjections, || {
            let data_dir = plan.resolve(&plan.provider_data_dir);
            staging::stage_projections(&staging_dir, &data_dir, &plan.projections).map(|_| ())
        })?;

        self.step(steps, RunStep::StartCoordination, || {
            services.push(ServiceProcess::spawn(&plan.coordination_spec())?);
            Ok(())
        })?;

        self.step(steps, RunStep::AwaitCoordination, || match services.last_mut() {
            Some(coordination) => coordination.await_ready(&probe, &self.cancel).map(|_| ()),
            None => Ok(()),
        })?;

        self.step(steps, RunStep::StartProvider, || {
            services.push(ServiceProcess::spawn(&plan.provider_spec())?);
            Ok(())
        })?;

        self.step(steps, RunStep::RunCompute, || {
            let mut compute = ServiceProcess::spawn(&plan.compute_spec())?;
            compute
                .wait_alongside(services.as_mut_slice(), &self.cancel, plan.compute_timeout)
                .map(|_| ())
        })?;

        self.step(steps, RunStep::CollectResult, || {
            let output = plan.resolve(&plan.output);
            staging::relocate(&plan.result_path(), &output)?;
            Ok(output)
        })
    }

    fn step<T>(
        &self,
        steps: &mut Vec<StepTiming>,
        step: RunStep,
        f: impl FnOnce() -> Result<T, BenchError>,
    ) -> Result<T, BenchError> {
        if let Err(e) = self.cancel.check_cancelled() {
            self.observer.on_step_failed(step, &e);
            return Err(e);
        }
        self.observer.on_step_started(step);
        tracing::debug!(%step, "step started");

        let start = Instant::now();
        match f() {
            Ok(value) => {
                let elapsed: Duration = start.elapsed();
                tracing::info!(%step, ?elapsed, "step finished");
                self.observer.on_step_finished(step, elapsed);
                steps.push(StepTiming { step, elapsed });
                Ok(value)
            }
            Err(e) => {
                tracing::error!(%step, error = %e, "step failed");
                self.observer.on_step_failed(step, &e);
                Err(e)
            }
        }
    }
}
