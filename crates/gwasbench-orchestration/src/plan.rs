//! Explicit description of every path and command a run touches.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gwasbench_core::config::{load_config, ComputeConfig, Endpoint};
use gwasbench_core::constants::{
    DEFAULT_COMPARISON_FILE, DEFAULT_READY_TIMEOUT, DEFAULT_RESULT_FILE,
};
use gwasbench_core::error::BenchError;

use crate::command::CommandSpec;
use crate::process::ServiceSpec;
use crate::readiness::ReadinessProbe;
use crate::staging::DEFAULT_PROJECTIONS;

/// Extra flag forwarded to the compute host after its config path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComputeMode {
    #[default]
    Normal,
    Simulation,
    Debug,
}

impl ComputeMode {
    #[must_use]
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Simulation => Some("--simulation"),
            Self::Debug => Some("--debug"),
        }
    }
}

/// How the coordination server's readiness is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessMode {
    /// TCP probe against the endpoint named in the compute config
    /// (or `endpoint` when set).
    Tcp { endpoint: Option<Endpoint> },
    /// Fixed pause.
    Delay(Duration),
    /// Liveness file, relative to the coordination directory.
    File(PathBuf),
}

/// Everything one run needs. Relative paths are resolved against `work_root`.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub work_root: PathBuf,

    /// Produces the projections inside `staging_dir`; when `None` they must already be there.
    pub exporter: Option<CommandSpec>,
    pub staging_dir: PathBuf,
    pub projections: Vec<String>,
    pub provider_data_dir: PathBuf,

    pub coordination_dir: PathBuf,
    pub coordination_cmd: CommandSpec,

    pub provider_dir: PathBuf,
    pub provider_cmd: CommandSpec,
    /// Relative to `provider_dir`.
    pub provider_config: PathBuf,

    pub compute_dir: PathBuf,
    pub compute_cmd: CommandSpec,
    /// Relative to `compute_dir`.
    pub compute_config: PathBuf,
    pub compute_mode: ComputeMode,
    pub compute_timeout: Option<Duration>,

    pub readiness: ReadinessMode,
    pub ready_timeout: Duration,

    /// File the coordination server writes, relative to `coordination_dir`.
    pub result_name: String,
    /// Canonical location of the result for the validator.
    pub output: PathBuf,
    /// Service stdout/stderr logs; inherited when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("."),
            exporter: None,
            staging_dir: PathBuf::from("hail_demo"),
            projections: DEFAULT_PROJECTIONS.iter().map(|s| (*s).to_string()).collect(),
            provider_data_dir: PathBuf::from("dpi/dpi_data"),
            coordination_dir: PathBuf::from("coordination_server"),
            coordination_cmd: CommandSpec::new("make").arg("run"),
            provider_dir: PathBuf::from("dpi"),
            provider_cmd: CommandSpec::new("./bin/dpi"),
            provider_config: PathBuf::from("configs/dpi_config-demo.json"),
            compute_dir: PathBuf::from("enclave_node/host"),
            compute_cmd: CommandSpec::new("./gwashost"),
            compute_config: PathBuf::from("configs/enclave_node_config-demo.json"),
            compute_mode: ComputeMode::Normal,
            compute_timeout: None,
            readiness: ReadinessMode::Tcp { endpoint: None },
            ready_timeout: DEFAULT_READY_TIMEOUT,
            result_name: DEFAULT_RESULT_FILE.to_string(),
            output: PathBuf::from("hail_demo").join(DEFAULT_COMPARISON_FILE),
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

impl RunPlan {
    /// Resolve `path` against the work root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_root.join(path)
        }
    }

    fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(|d| self.resolve(d))
    }

    pub(crate) fn exporter_log_dir(&self) -> Option<PathBuf> {
        self.log_dir()
    }

    pub(crate) fn coordination_spec(&self) -> ServiceSpec {
        ServiceSpec {
            name: "coordination".into(),
            command: self.coordination_cmd.clone(),
            working_dir: self.resolve(&self.coordination_dir),
            log_dir: self.log_dir(),
        }
    }

    pub(crate) fn provider_spec(&self) -> ServiceSpec {
        let config = self.provider_config.to_string_lossy().into_owned();
        ServiceSpec {
            name: "provider".into(),
            command: self.provider_cmd.clone().arg(config),
            working_dir: self.resolve(&self.provider_dir),
            log_dir: self.log_dir(),
        }
    }

    pub(crate) fn compute_spec(&self) -> ServiceSpec {
        let config = self.compute_config.to_string_lossy().into_owned();
        let mut command = self.compute_cmd.clone().arg(config);
        if let Some(flag) = self.compute_mode.flag() {
            command = command.arg(flag);
        }
        ServiceSpec {
            name: "compute".into(),
            command,
            working_dir: self.resolve(&self.compute_dir),
            log_dir: self.log_dir(),
        }
    }

    /// Path of the compute config on disk.
    #[must_use]
    pub fn compute_config_path(&self) -> PathBuf {
        self.resolve(&self.compute_dir).join(&self.compute_config)
    }

    /// Path of the result the coordination server writes.
    #[must_use]
    pub fn result_path(&self) -> PathBuf {
        self.resolve(&self.coordination_dir).join(&self.result_name)
    }

    /// Turn the readiness mode into a concrete probe. A TCP probe without an
    /// explicit endpoint reads it from the compute config.
    pub fn readiness_probe(&self) -> Result<ReadinessProbe, BenchError> {
        match &self.readiness {
            ReadinessMode::Delay(d) => Ok(ReadinessProbe::Delay(*d)),
            ReadinessMode::File(path) => Ok(ReadinessProbe::File {
                path: self.resolve(&self.coordination_dir).join(path),
                timeout: self.ready_timeout,
            }),
            ReadinessMode::Tcp { endpoint } => {
                let endpoint = match endpoint {
                    Some(e) => e.clone(),
                    None => {
                        load_config::<ComputeConfig>(&self.compute_config_path())?
                            .coordination_server_info
                    }
                };
                Ok(ReadinessProbe::Tcp {
                    endpoint,
                    timeout: self.ready_timeout,
                })
            }
        }
    }
}
