//! Experiment matrix generator.
//!
//! Writes one provider config per scale, one compute config per
//! (feature count, scale) point, and one coordination config per grid.
//! Generation is deterministic: rerunning with the same grid and template
//! rewrites every file byte-for-byte.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::config::{ConfigTemplate, ServiceConfig};
use crate::error::BenchError;
use crate::layout::ArtifactLayout;
use crate::point::ExperimentGrid;
use crate::render::render;

/// Which role a generated file configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Provider,
    Compute,
    Coordination,
}

/// A config document together with the path it will be written to.
#[derive(Debug, Clone)]
pub struct PlannedArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub config: ServiceConfig,
}

impl PlannedArtifact {
    /// File contents in the fixed layout.
    #[must_use]
    pub fn contents(&self) -> String {
        render(&self.config)
    }
}

/// Outcome of a generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub provider_files: usize,
    pub compute_files: usize,
    pub coordination_files: usize,
    /// Paths in grid order.
    pub paths: Vec<PathBuf>,
}

impl GenerationSummary {
    fn from_plan(plan: &[PlannedArtifact]) -> Self {
        let count = |kind| plan.iter().filter(|a| a.kind == kind).count();
        Self {
            provider_files: count(ArtifactKind::Provider),
            compute_files: count(ArtifactKind::Compute),
            coordination_files: count(ArtifactKind::Coordination),
            paths: plan.iter().map(|a| a.path.clone()).collect(),
        }
    }

    /// Total number of files.
    #[must_use]
    pub fn total(&self) -> usize {
        self.provider_files + self.compute_files + self.coordination_files
    }
}

/// Generates the config files for every point of a grid.
#[derive(Debug, Clone)]
pub struct MatrixGenerator {
    grid: ExperimentGrid,
    template: ConfigTemplate,
    layout: ArtifactLayout,
}

impl MatrixGenerator {
    #[must_use]
    pub fn new(grid: ExperimentGrid, template: ConfigTemplate, layout: ArtifactLayout) -> Self {
        Self {
            grid,
            template,
            layout,
        }
    }

    /// Every artifact the generator would write, in grid order.
    pub fn plan(&self) -> Result<Vec<PlannedArtifact>, BenchError> {
        let mut plan = Vec::with_capacity(self.grid.len() + self.grid.scales().len() + 1);

        for (scale_index, &scale) in self.grid.scales().iter().enumerate() {
            plan.push(PlannedArtifact {
                kind: ArtifactKind::Provider,
                path: self.layout.provider_path(scale),
                config: ServiceConfig::Provider(self.template.provider_config(scale, scale_index)?),
            });
        }

        for (point_index, point) in self.grid.points().enumerate() {
            plan.push(PlannedArtifact {
                kind: ArtifactKind::Compute,
                path: self.layout.compute_path(point),
                config: ServiceConfig::Compute(self.template.compute_config(point, point_index)?),
            });
        }

        plan.push(PlannedArtifact {
            kind: ArtifactKind::Coordination,
            path: self.layout.coordination_path(),
            config: ServiceConfig::Coordination(self.template.coordination_config()),
        });

        Ok(plan)
    }

    /// Summary of what [`generate`](Self::generate) would write, without touching the filesystem.
    pub fn dry_run(&self) -> Result<GenerationSummary, BenchError> {
        Ok(GenerationSummary::from_plan(&self.plan()?))
    }

    /// Write every artifact. The first write error aborts the pass.
    pub fn generate(&self) -> Result<GenerationSummary, BenchError> {
        let plan = self.plan()?;

        let dirs: BTreeSet<PathBuf> = plan
            .iter()
            .filter_map(|a| a.path.parent().map(PathBuf::from))
            .collect();
        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;
        }

        // Cells write disjoint files, so they can be emitted in parallel.
        plan.par_iter().try_for_each(|artifact| {
            std::fs::write(&artifact.path, artifact.contents())
                .map_err(|e| BenchError::io(&artifact.path, e))
        })?;

        let summary = GenerationSummary::from_plan(&plan);
        tracing::info!(
            providers = summary.provider_files,
            computes = summary.compute_files,
            points = self.grid.len(),
            "generated experiment configs"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputeConfig;
    use crate::point::GridRange;
    use tempfile::TempDir;

    fn small_grid() -> ExperimentGrid {
        ExperimentGrid::new(
            GridRange::new(100_000, 200_001, 100_000).unwrap(),
            GridRange::new(1, 3, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn two_by_two_grid_file_counts() {
        let dir = TempDir::new().unwrap();
        let generator = MatrixGenerator::new(
            small_grid(),
            ConfigTemplate::default(),
            ArtifactLayout::under(dir.path()),
        );
        let summary = generator.generate().unwrap();
        assert_eq!(summary.provider_files, 2);
        assert_eq!(summary.compute_files, 4);
        assert_eq!(summary.coordination_files, 1);

        let compute_dir = dir.path().join("enclave_node/host/configs");
        assert_eq!(std::fs::read_dir(compute_dir).unwrap().count(), 4);
        let provider_dir = dir.path().join("dpi/configs");
        assert_eq!(std::fs::read_dir(provider_dir).unwrap().count(), 2);
    }

    #[test]
    fn plan_is_in_grid_order() {
        let generator = MatrixGenerator::new(
            small_grid(),
            ConfigTemplate::default(),
            ArtifactLayout::under(std::path::Path::new("out")),
        );
        let names: Vec<String> = generator
            .plan()
            .unwrap()
            .iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "dpi_config-100000.json",
                "dpi_config-200000.json",
                "enclave_node_config-1-100000.json",
                "enclave_node_config-2-100000.json",
                "enclave_node_config-1-200000.json",
                "enclave_node_config-2-200000.json",
                "coordination_server_config.json",
            ]
        );
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let generator = MatrixGenerator::new(
            small_grid(),
            ConfigTemplate::default(),
            ArtifactLayout::under(dir.path()),
        );
        let first = generator.generate().unwrap();
        let before: Vec<Vec<u8>> = first.paths.iter().map(|p| std::fs::read(p).unwrap()).collect();
        let second = generator.generate().unwrap();
        let after: Vec<Vec<u8>> = second.paths.iter().map(|p| std::fs::read(p).unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[test]
    fn written_compute_config_parses() {
        let dir = TempDir::new().unwrap();
        let layout = ArtifactLayout::under(dir.path());
        MatrixGenerator::new(small_grid(), ConfigTemplate::default(), layout.clone())
            .generate()
            .unwrap();
        let point = crate::point::ExperimentPoint::new(200_000, 2).unwrap();
        let cfg: ComputeConfig =
            crate::config::load_config(&layout.compute_path(point)).unwrap();
        assert_eq!(cfg.covariants, vec!["1-200000", "2-200000"]);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let generator = MatrixGenerator::new(
            small_grid(),
            ConfigTemplate::default(),
            ArtifactLayout::under(dir.path()),
        );
        let summary = generator.dry_run().unwrap();
        assert_eq!(summary.total(), 7);
        assert!(summary.paths.iter().all(|p| !p.exists()));
        assert!(!dir.path().join("dpi").exists());
    }

    #[test]
    fn write_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("dpi");
        std::fs::write(&blocker, "not a directory").unwrap();
        let generator = MatrixGenerator::new(
            small_grid(),
            ConfigTemplate::default(),
            ArtifactLayout::under(dir.path()),
        );
        assert!(matches!(generator.generate(), Err(BenchError::Io { .. })));
    }
}
