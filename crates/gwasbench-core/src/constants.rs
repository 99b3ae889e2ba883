//! Defaults for the experiment grid, the generated configs, and the run layout.

use std::time::Duration;

/// First scale (record count) of the default grid.
pub const DEFAULT_SCALE_START: u64 = 100_000;

/// Exclusive upper bound of the default scale range.
pub const DEFAULT_SCALE_END: u64 = 2_100_000;

/// Step between scales in the default grid.
pub const DEFAULT_SCALE_STEP: u64 = 100_000;

/// Smallest supported covariate count.
pub const MIN_FEATURE_COUNT: u32 = 1;

/// Largest supported covariate count.
pub const MAX_FEATURE_COUNT: u32 = 16;

/// Name the provider registers under with the coordination server.
pub const DEFAULT_PROVIDER_NAME: &str = "dpi1";

/// Provider bind port (base port under a per-point policy).
pub const DEFAULT_PROVIDER_PORT: u16 = 18601;

/// Compute node bind port (base port under a per-point policy).
pub const DEFAULT_COMPUTE_PORT: u16 = 16701;

/// Coordination server host written into every config.
pub const DEFAULT_COORDINATION_HOST: &str = "localhost";

/// Coordination server port written into every config.
pub const DEFAULT_COORDINATION_PORT: u16 = 6401;

/// Signed compute-role binary, relative to the compute host directory.
pub const DEFAULT_ENCLAVE_PATH: &str = "../enclave/gwasenc.signed";

/// Prefix of the scale-specific genotype file.
pub const DEFAULT_ALLELE_PREFIX: &str = "dpi_data/generated_alleles";

/// Fixed secondary size embedded in the genotype filename.
pub const DEFAULT_ALLELE_SECONDARY: u64 = 125_000;

/// Extension of the genotype file.
pub const DEFAULT_ALLELE_EXTENSION: &str = "tsv";

/// Result file the coordination server writes.
pub const DEFAULT_RESULT_FILE: &str = "results.out";

/// Canonical name the result is relocated to for comparison.
pub const DEFAULT_COMPARISON_FILE: &str = "SECRET_results.vcf";

/// Fixed pause used when readiness is approximated by a delay.
pub const DEFAULT_READY_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on waiting for a service to become ready.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between readiness and liveness polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a service's process group gets between SIGTERM and SIGKILL.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// 0-based column carrying the statistic in a result row.
pub const STATISTIC_FIELD: usize = 4;

/// Decimal digits kept when displaying discrepancies.
pub const DISPLAY_DIGITS: i32 = 6;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// A readiness wait or the compute step timed out.
    pub const ERROR_TIMEOUT: i32 = 2;
    /// Validation found a discrepancy above the tolerance.
    pub const ERROR_MISMATCH: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// A service process failed to start or exited unsuccessfully.
    pub const ERROR_PROCESS: i32 = 5;
    /// Run cancelled by user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}
