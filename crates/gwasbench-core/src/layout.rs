//! Deterministic on-disk locations of the generated configs.

use std::path::{Path, PathBuf};

use crate::point::ExperimentPoint;

/// Provider config directory, relative to the service checkout.
pub const DEFAULT_PROVIDER_DIR: &str = "dpi/configs";

/// Compute config directory, relative to the service checkout.
pub const DEFAULT_COMPUTE_DIR: &str = "enclave_node/host/configs";

/// Coordination config directory, relative to the service checkout.
pub const DEFAULT_COORDINATION_DIR: &str = "coordination_server/configs";

/// Directories the generator writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub provider_dir: PathBuf,
    pub compute_dir: PathBuf,
    pub coordination_dir: PathBuf,
}

impl ArtifactLayout {
    /// Layout with all three directories under `root`.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            provider_dir: root.join(DEFAULT_PROVIDER_DIR),
            compute_dir: root.join(DEFAULT_COMPUTE_DIR),
            coordination_dir: root.join(DEFAULT_COORDINATION_DIR),
        }
    }

    /// `dpi_config-<scale>.json`
    #[must_use]
    pub fn provider_path(&self, scale: u64) -> PathBuf {
        self.provider_dir.join(format!("dpi_config-{scale}.json"))
    }

    /// `enclave_node_config-<features>-<scale>.json`
    #[must_use]
    pub fn compute_path(&self, point: ExperimentPoint) -> PathBuf {
        self.compute_dir.join(format!(
            "enclave_node_config-{}-{}.json",
            point.feature_count(),
            point.scale()
        ))
    }

    #[must_use]
    pub fn coordination_path(&self) -> PathBuf {
        self.coordination_dir.join("coordination_server_config.json")
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::under(Path::new("."))
    }
}
