//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gwasbench_core::config::{AlleleNaming, AnalysisType, ConfigTemplate, Endpoint, PortPolicy};
use gwasbench_core::constants::{
    DEFAULT_ALLELE_EXTENSION, DEFAULT_ALLELE_PREFIX, DEFAULT_ALLELE_SECONDARY,
    DEFAULT_COMPUTE_PORT, DEFAULT_COORDINATION_HOST, DEFAULT_COORDINATION_PORT,
    DEFAULT_ENCLAVE_PATH, DEFAULT_PROVIDER_NAME, DEFAULT_PROVIDER_PORT, DEFAULT_READY_DELAY,
    DEFAULT_RESULT_FILE, DEFAULT_SCALE_END, DEFAULT_SCALE_START, DEFAULT_SCALE_STEP, MAX_FEATURE_COUNT,
    MIN_FEATURE_COUNT,
};
use gwasbench_core::error::BenchError;
use gwasbench_core::layout::{
    ArtifactLayout, DEFAULT_COMPUTE_DIR, DEFAULT_COORDINATION_DIR, DEFAULT_PROVIDER_DIR,
};
use gwasbench_core::point::{ExperimentGrid, GridRange};
use gwasbench_core::validator::LengthPolicy;
use gwasbench_orchestration::command::CommandSpec;
use gwasbench_orchestration::plan::{ComputeMode, ReadinessMode, RunPlan};

/// Benchmark harness for a distributed GWAS service.
#[derive(Parser, Debug)]
#[command(name = "gwasbench", version, about)]
pub struct AppConfig {
    /// Debug-level logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print results and warnings.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Default log directive derived from `-v` / `-q`.
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write provider, compute, and coordination configs for a grid of experiments.
    Generate(GenerateArgs),
    /// Run one experiment against the service checkout.
    Run(RunArgs),
    /// Compare a computed result file against a reference.
    Validate(ValidateArgs),
    /// Print a shell completion script.
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPolicyArg {
    Fixed,
    PerPoint,
}

impl From<PortPolicyArg> for PortPolicy {
    fn from(arg: PortPolicyArg) -> Self {
        match arg {
            PortPolicyArg::Fixed => Self::Fixed,
            PortPolicyArg::PerPoint => Self::PerPoint,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisArg {
    Linear,
    Logistic,
}

impl From<AnalysisArg> for AnalysisType {
    fn from(arg: AnalysisArg) -> Self {
        match arg {
            AnalysisArg::Linear => Self::Linear,
            AnalysisArg::Logistic => Self::Logistic,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, default_value_t = DEFAULT_SCALE_START)]
    pub scale_start: u64,

    /// Exclusive.
    #[arg(long, default_value_t = DEFAULT_SCALE_END)]
    pub scale_end: u64,

    #[arg(long, default_value_t = DEFAULT_SCALE_STEP)]
    pub scale_step: u64,

    #[arg(long, default_value_t = MIN_FEATURE_COUNT)]
    pub features_start: u32,

    /// Exclusive.
    #[arg(long, default_value_t = MAX_FEATURE_COUNT + 1)]
    pub features_end: u32,

    #[arg(long, default_value_t = 1)]
    pub features_step: u32,

    #[arg(long, default_value = DEFAULT_PROVIDER_DIR)]
    pub provider_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_COMPUTE_DIR)]
    pub compute_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_COORDINATION_DIR)]
    pub coordination_dir: PathBuf,

    /// Coordination server host written into every config.
    #[arg(long, default_value = DEFAULT_COORDINATION_HOST)]
    pub hostname: String,

    #[arg(long, default_value_t = DEFAULT_COORDINATION_PORT)]
    pub coordination_port: u16,

    #[arg(long, default_value = DEFAULT_PROVIDER_NAME)]
    pub provider_name: String,

    /// Provider bind port (base port with `--port-policy per-point`).
    #[arg(long, default_value_t = DEFAULT_PROVIDER_PORT)]
    pub provider_port: u16,

    /// Compute bind port (base port with `--port-policy per-point`).
    #[arg(long, default_value_t = DEFAULT_COMPUTE_PORT)]
    pub compute_port: u16,

    #[arg(long, value_enum, default_value_t = PortPolicyArg::Fixed)]
    pub port_policy: PortPolicyArg,

    #[arg(long, value_enum, default_value_t = AnalysisArg::Linear)]
    pub analysis: AnalysisArg,

    #[arg(long, default_value = DEFAULT_ENCLAVE_PATH)]
    pub enclave_path: String,

    #[arg(long, default_value = DEFAULT_ALLELE_PREFIX)]
    pub allele_prefix: String,

    #[arg(long, default_value_t = DEFAULT_ALLELE_SECONDARY)]
    pub allele_secondary: u64,

    #[arg(long, default_value = DEFAULT_ALLELE_EXTENSION)]
    pub allele_ext: String,

    /// List the files that would be written without writing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn grid(&self) -> Result<ExperimentGrid, BenchError> {
        ExperimentGrid::new(
            GridRange::new(self.scale_start, self.scale_end, self.scale_step)?,
            GridRange::new(
                u64::from(self.features_start),
                u64::from(self.features_end),
                u64::from(self.features_step),
            )?,
        )
    }

    #[must_use]
    pub fn template(&self) -> ConfigTemplate {
        ConfigTemplate {
            provider_name: self.provider_name.clone(),
            provider_port: self.provider_port,
            compute_port: self.compute_port,
            coordination: Endpoint::new(self.hostname.clone(), self.coordination_port),
            analysis: self.analysis.into(),
            enclave_path: self.enclave_path.clone(),
            allele: AlleleNaming {
                prefix: self.allele_prefix.clone(),
                secondary: self.allele_secondary,
                extension: self.allele_ext.clone(),
            },
            port_policy: self.port_policy.into(),
            result_file: DEFAULT_RESULT_FILE.to_string(),
        }
    }

    #[must_use]
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout {
            provider_dir: self.provider_dir.clone(),
            compute_dir: self.compute_dir.clone(),
            coordination_dir: self.coordination_dir.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeModeArg {
    Normal,
    Simulation,
    Debug,
}

impl From<ComputeModeArg> for ComputeMode {
    fn from(arg: ComputeModeArg) -> Self {
        match arg {
            ComputeModeArg::Normal => Self::Normal,
            ComputeModeArg::Simulation => Self::Simulation,
            ComputeModeArg::Debug => Self::Debug,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyProbeArg {
    /// Poll a TCP connection to the coordination endpoint.
    Tcp,
    /// Sleep for `--ready-delay`.
    Delay,
    /// Wait for `--ready-file` to appear.
    File,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Root of the service checkout; relative paths below resolve against it.
    #[arg(long, env = "GWASBENCH_WORK_ROOT", default_value = ".")]
    pub work_root: PathBuf,

    /// Command that writes the input projections into the staging directory.
    #[arg(long)]
    pub exporter: Option<CommandSpec>,

    #[arg(long, default_value = "hail_demo")]
    pub staging_dir: PathBuf,

    #[arg(long, default_value = "dpi/dpi_data")]
    pub provider_data_dir: PathBuf,

    #[arg(long, default_value = "coordination_server")]
    pub coordination_dir: PathBuf,

    #[arg(long, default_value = "make run")]
    pub coordination_cmd: CommandSpec,

    #[arg(long, default_value = "dpi")]
    pub provider_dir: PathBuf,

    #[arg(long, default_value = "./bin/dpi")]
    pub provider_cmd: CommandSpec,

    /// Relative to the provider directory.
    #[arg(long, default_value = "configs/dpi_config-demo.json")]
    pub provider_config: PathBuf,

    #[arg(long, default_value = "enclave_node/host")]
    pub compute_dir: PathBuf,

    #[arg(long, default_value = "./gwashost")]
    pub compute_cmd: CommandSpec,

    /// Relative to the compute directory.
    #[arg(long, default_value = "configs/enclave_node_config-demo.json")]
    pub compute_config: PathBuf,

    #[arg(long, value_enum, default_value_t = ComputeModeArg::Normal)]
    pub compute_mode: ComputeModeArg,

    #[arg(long, value_enum, default_value_t = ReadyProbeArg::Tcp)]
    pub ready_probe: ReadyProbeArg,

    /// Probe this `host:port` instead of the endpoint in the compute config.
    #[arg(long)]
    pub ready_endpoint: Option<Endpoint>,

    /// Fixed wait for the delay probe [default: 500ms].
    #[arg(long, value_parser = parse_duration)]
    pub ready_delay: Option<Duration>,

    /// Liveness file, relative to the coordination directory.
    #[arg(long, default_value = "ready")]
    pub ready_file: PathBuf,

    #[arg(long, value_parser = parse_duration, default_value = "10s")]
    pub ready_timeout: Duration,

    /// Bound on the compute step (e.g. "30m"); unbounded when absent.
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Result file written by the coordination server, relative to its directory.
    #[arg(long, default_value = DEFAULT_RESULT_FILE)]
    pub result_name: String,

    #[arg(long, default_value = "hail_demo/SECRET_results.vcf")]
    pub output: PathBuf,

    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Let service output go to the terminal instead of log files.
    #[arg(long)]
    pub no_log_files: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    #[must_use]
    pub fn plan(&self) -> RunPlan {
        let readiness = match self.ready_probe {
            ReadyProbeArg::Tcp => ReadinessMode::Tcp {
                endpoint: self.ready_endpoint.clone(),
            },
            ReadyProbeArg::Delay => ReadinessMode::Delay(self.ready_delay.unwrap_or(DEFAULT_READY_DELAY)),
            ReadyProbeArg::File => ReadinessMode::File(self.ready_file.clone()),
        };
        RunPlan {
            work_root: self.work_root.clone(),
            exporter: self.exporter.clone(),
            staging_dir: self.staging_dir.clone(),
            provider_data_dir: self.provider_data_dir.clone(),
            coordination_dir: self.coordination_dir.clone(),
            coordination_cmd: self.coordination_cmd.clone(),
            provider_dir: self.provider_dir.clone(),
            provider_cmd: self.provider_cmd.clone(),
            provider_config: self.provider_config.clone(),
            compute_dir: self.compute_dir.clone(),
            compute_cmd: self.compute_cmd.clone(),
            compute_config: self.compute_config.clone(),
            compute_mode: self.compute_mode.into(),
            compute_timeout: self.timeout,
            readiness,
            ready_timeout: self.ready_timeout,
            result_name: self.result_name.clone(),
            output: self.output.clone(),
            log_dir: (!self.no_log_files).then(|| self.log_dir.clone()),
            ..RunPlan::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Result produced by the service (no header).
    pub computed: PathBuf,

    /// Trusted reference output (one header line).
    pub reference: PathBuf,

    /// Compare the common prefix when row counts differ.
    #[arg(long)]
    pub allow_truncation: bool,

    /// Fail when the maximum difference exceeds this value.
    #[arg(long, value_parser = parse_tolerance)]
    pub tolerance: Option<f64>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    #[must_use]
    pub fn length_policy(&self) -> LengthPolicy {
        if self.allow_truncation {
            LengthPolicy::AllowTruncation
        } else {
            LengthPolicy::Strict
        }
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "1h". A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("invalid duration: {s:?}");
    let number = |digits: &str| digits.parse::<u64>().map_err(|_| invalid());
    if let Some(ms) = s.strip_suffix("ms") {
        Ok(Duration::from_millis(number(ms)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        let secs = number(mins)?.checked_mul(60).ok_or_else(invalid)?;
        Ok(Duration::from_secs(secs))
    } else if let Some(hours) = s.strip_suffix('h') {
        let secs = number(hours)?.checked_mul(3600).ok_or_else(invalid)?;
        Ok(Duration::from_secs(secs))
    } else if let Some(secs) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(secs)?))
    } else {
        Ok(Duration::from_secs(number(s)?))
    }
}

/// Parse a tolerance: a finite, non-negative number.
pub fn parse_tolerance(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid tolerance: {s:?}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("tolerance must be a finite, non-negative number, got {s:?}"))
    }
}
