//! Error handling and exit codes.

use gwasbench_core::constants::exit_codes;
use gwasbench_core::error::BenchError;

/// Exit code for a top-level error, taken from the first [`BenchError`] in its chain.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BenchError>())
        .map_or(exit_codes::ERROR_GENERIC, BenchError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn error_codes() {
        assert_eq!(exit_code(&BenchError::Cancelled.into()), 130);
        assert_eq!(exit_code(&BenchError::Timeout(Duration::from_secs(1)).into()), 2);
        assert_eq!(
            exit_code(
                &BenchError::ToleranceExceeded {
                    max: 0.5,
                    tolerance: 0.1
                }
                .into()
            ),
            3
        );
        assert_eq!(exit_code(&BenchError::Config("bad".into()).into()), 4);
        assert_eq!(
            exit_code(
                &BenchError::ProcessFailed {
                    service: "compute".into(),
                    status: "exit status: 1".into()
                }
                .into()
            ),
            5
        );
    }

    #[test]
    fn context_is_looked_through() {
        let err = anyhow::Error::new(BenchError::Cancelled).context("running experiment");
        assert_eq!(exit_code(&err), 130);
    }

    #[test]
    fn foreign_errors_are_generic() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
