//! Error type shared by every gwasbench crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::exit_codes;

/// Error type for generation, orchestration, and validation.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Invalid ranges, ports, or other harness configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A (scale, feature count) pair outside the supported bounds.
    #[error("invalid experiment point: {0}")]
    InvalidPoint(String),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config document or result row could not be parsed.
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The two compared result streams have different row counts.
    #[error("row count mismatch: computed stream has {computed} rows, reference stream has {reference}")]
    LengthMismatch { computed: usize, reference: usize },

    /// No rows were available for comparison.
    #[error("no rows to compare")]
    EmptyComparison,

    /// The maximum discrepancy is above the accepted tolerance.
    #[error("maximum difference {max} exceeds tolerance {tolerance}")]
    ToleranceExceeded { max: f64, tolerance: f64 },

    /// A file the run depends on does not exist.
    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// A service executable could not be launched.
    #[error("failed to start {service} ({program}): {source}")]
    ProcessSpawn {
        service: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking process finished with a non-zero status.
    #[error("{service} failed: {status}")]
    ProcessFailed { service: String, status: String },

    /// A background service died while the run still depended on it.
    #[error("{service} exited before the run finished: {status}")]
    ProcessExited { service: String, status: String },

    /// A service did not become ready in time.
    #[error("{service} not ready after {waited:?}")]
    ReadinessTimeout { service: String, waited: Duration },

    /// The run was cancelled.
    #[error("run cancelled")]
    Cancelled,

    /// The compute step exceeded its time budget.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl BenchError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Exit code the binary reports for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidPoint(_) => exit_codes::ERROR_CONFIG,
            Self::ReadinessTimeout { .. } | Self::Timeout(_) => exit_codes::ERROR_TIMEOUT,
            Self::ToleranceExceeded { .. } => exit_codes::ERROR_MISMATCH,
            Self::ProcessSpawn { .. } | Self::ProcessFailed { .. } | Self::ProcessExited { .. } => {
                exit_codes::ERROR_PROCESS
            }
            Self::Cancelled => exit_codes::ERROR_CANCELED,
            Self::Io { .. }
            | Self::Parse { .. }
            | Self::LengthMismatch { .. }
            | Self::EmptyComparison
            | Self::MissingArtifact(_) => exit_codes::ERROR_GENERIC,
        }
    }
}
