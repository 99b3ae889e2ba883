//! Service configuration documents and the template they are derived from.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ALLELE_EXTENSION, DEFAULT_ALLELE_PREFIX, DEFAULT_ALLELE_SECONDARY,
    DEFAULT_COMPUTE_PORT, DEFAULT_COORDINATION_HOST, DEFAULT_COORDINATION_PORT,
    DEFAULT_ENCLAVE_PATH, DEFAULT_PROVIDER_NAME, DEFAULT_PROVIDER_PORT, DEFAULT_RESULT_FILE,
};
use crate::error::BenchError;
use crate::point::ExperimentPoint;

/// Network address of the coordination server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
}

impl Endpoint {
    #[must_use]
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_COORDINATION_HOST, DEFAULT_COORDINATION_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = BenchError;

    /// Parse `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BenchError::Config(format!("expected host:port, got {s:?}")))?;
        if host.is_empty() {
            return Err(BenchError::Config(format!("missing host in {s:?}")));
        }
        let port = port
            .parse()
            .map_err(|_| BenchError::Config(format!("invalid port in {s:?}")))?;
        Ok(Self::new(host, port))
    }
}

/// Regression performed by the compute role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Linear,
    Logistic,
}

impl AnalysisType {
    /// Tag written into the compute config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Logistic => "logistic",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "logistic" => Ok(Self::Logistic),
            other => Err(BenchError::Config(format!("unknown analysis type: {other}"))),
        }
    }
}

/// How bind ports are assigned across the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortPolicy {
    /// Every config uses the base ports; experiments must run one at a time.
    #[default]
    Fixed,
    /// Ports are offset by the position of the scale (provider) or the
    /// point (compute) in the grid.
    PerPoint,
}

impl PortPolicy {
    /// Port for the `index`-th keyed artifact.
    pub fn port(self, base: u16, index: usize) -> Result<u16, BenchError> {
        match self {
            Self::Fixed => Ok(base),
            Self::PerPoint => u16::try_from(index)
                .ok()
                .and_then(|offset| base.checked_add(offset))
                .ok_or_else(|| {
                    BenchError::Config(format!("port {base} + {index} does not fit in u16"))
                }),
        }
    }
}

/// Configuration read by a provider (DPI) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub dpi_name: String,
    pub dpi_bind_port: u16,
    pub allele_file: String,
    pub coordination_server_info: Endpoint,
}

/// Configuration read by the compute (enclave node) host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    pub enclave_node_bind_port: u16,
    pub covariants: Vec<String>,
    pub institutions: Vec<String>,
    pub y_val_name: String,
    pub analysis_type: AnalysisType,
    pub enclave_path: String,
    pub coordination_server_info: Endpoint,
}

/// Configuration read by the coordination server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationConfig {
    pub coordination_server_bind_port: u16,
    pub enclave_node_count: u32,
    pub dpi_count: u32,
    pub output_file_name: String,
}

/// Any of the generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceConfig {
    Provider(ProviderConfig),
    Compute(ComputeConfig),
    Coordination(CoordinationConfig),
}

/// Naming scheme of the scale-specific genotype file:
/// `<prefix>_<scale>-<secondary>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleNaming {
    pub prefix: String,
    pub secondary: u64,
    pub extension: String,
}

impl AlleleNaming {
    #[must_use]
    pub fn file_for(&self, scale: u64) -> String {
        format!(
            "{}_{scale}-{}.{}",
            self.prefix, self.secondary, self.extension
        )
    }
}

impl Default for AlleleNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ALLELE_PREFIX.to_string(),
            secondary: DEFAULT_ALLELE_SECONDARY,
            extension: DEFAULT_ALLELE_EXTENSION.to_string(),
        }
    }
}

/// Grid-invariant fields from which every per-point config is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTemplate {
    pub provider_name: String,
    pub provider_port: u16,
    pub compute_port: u16,
    pub coordination: Endpoint,
    pub analysis: AnalysisType,
    pub enclave_path: String,
    pub allele: AlleleNaming,
    pub port_policy: PortPolicy,
    pub result_file: String,
}

impl Default for ConfigTemplate {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_port: DEFAULT_PROVIDER_PORT,
            compute_port: DEFAULT_COMPUTE_PORT,
            coordination: Endpoint::default(),
            analysis: AnalysisType::default(),
            enclave_path: DEFAULT_ENCLAVE_PATH.to_string(),
            allele: AlleleNaming::default(),
            port_policy: PortPolicy::default(),
            result_file: DEFAULT_RESULT_FILE.to_string(),
        }
    }
}

impl ConfigTemplate {
    /// Provider config for `scale`, the `scale_index`-th scale of the grid.
    pub fn provider_config(
        &self,
        scale: u64,
        scale_index: usize,
    ) -> Result<ProviderConfig, BenchError> {
        Ok(ProviderConfig {
            dpi_name: self.provider_name.clone(),
            dpi_bind_port: self.port_policy.port(self.provider_port, scale_index)?,
            allele_file: self.allele.file_for(scale),
            coordination_server_info: self.coordination.clone(),
        })
    }

    /// Compute config for `point`, the `point_index`-th point of the grid.
    pub fn compute_config(
        &self,
        point: ExperimentPoint,
        point_index: usize,
    ) -> Result<ComputeConfig, BenchError> {
        Ok(ComputeConfig {
            enclave_node_bind_port: self.port_policy.port(self.compute_port, point_index)?,
            covariants: point.covariates(),
            institutions: vec![self.provider_name.clone()],
            y_val_name: point.outcome_label(),
            analysis_type: self.analysis,
            enclave_path: self.enclave_path.clone(),
            coordination_server_info: self.coordination.clone(),
        })
    }

    /// Coordination server config shared by the whole grid.
    #[must_use]
    pub fn coordination_config(&self) -> CoordinationConfig {
        CoordinationConfig {
            coordination_server_bind_port: self.coordination.port,
            enclave_node_count: 1,
            dpi_count: 1,
            output_file_name: self.result_file.clone(),
        }
    }
}

/// Load a generated config document from disk.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, BenchError> {
    let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| BenchError::Parse {
        path: path.to_path_buf(),
        line: e.line(),
        message: e.to_string(),
    })
}
