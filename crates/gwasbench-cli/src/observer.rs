//! Live step progress on stderr.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

use gwasbench_core::error::BenchError;
use gwasbench_orchestration::interfaces::{RunObserver, RunStep};

use crate::output::format_duration;
use crate::ui::{status_word, Status};

const TICK: Duration = Duration::from_millis(120);

/// Shows a spinner while a step runs and a status line when it ends.
pub struct CliRunObserver {
    spinner: Mutex<Option<ProgressBar>>,
    hidden: bool,
    finished: Mutex<Vec<(RunStep, Duration)>>,
}

impl CliRunObserver {
    /// A hidden observer still records timings but draws nothing.
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            hidden,
            finished: Mutex::new(Vec::new()),
        }
    }

    /// Steps that completed so far, in order.
    #[must_use]
    pub fn finished(&self) -> Vec<(RunStep, Duration)> {
        self.finished.lock().clone()
    }

    fn new_spinner(&self, step: RunStep) -> ProgressBar {
        let target = if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let bar = ProgressBar::with_draw_target(None, target);
        let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(step.label());
        bar.enable_steady_tick(TICK);
        bar
    }

    fn close(&self, line: String) {
        if let Some(bar) = self.spinner.lock().take() {
            if self.hidden {
                bar.finish_and_clear();
            } else {
                bar.finish_with_message(line);
            }
        }
    }
}

impl RunObserver for CliRunObserver {
    fn on_step_started(&self, step: RunStep) {
        let bar = self.new_spinner(step);
        if let Some(previous) = self.spinner.lock().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn on_step_finished(&self, step: RunStep, elapsed: Duration) {
        self.finished.lock().push((step, elapsed));
        self.close(format!(
            "{} {} ({})",
            status_word(Status::Ok, false),
            step.label(),
            format_duration(elapsed)
        ));
    }

    fn on_step_failed(&self, step: RunStep, error: &BenchError) {
        tracing::debug!(%step, %error, "step failed");
        self.close(format!(
            "{} {}: {error}",
            status_word(Status::Failed, false),
            step.label()
        ));
    }
}
