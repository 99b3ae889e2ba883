//! Run cancellation shared between the Ctrl+C handler and the orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::BenchError;

/// Set once by the interrupt handler, then observed by every blocking
/// wait of a benchmark run.
///
/// The orchestrator checks it between steps, and service waits poll it so
/// an interrupted run tears its services down and exits with
/// [`BenchError::Cancelled`].
///
/// ```
/// use gwasbench_core::cancel::CancellationToken;
///
/// let run = CancellationToken::new();
/// let handler = run.clone();
/// handler.cancel();
/// assert!(run.check_cancelled().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Ask the run to stop; idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// `Err(Cancelled)` once an interrupt has arrived.
    pub fn check_cancelled(&self) -> Result<(), BenchError> {
        if self.is_cancelled() {
            Err(BenchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
