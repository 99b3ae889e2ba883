//! Export and relocation of the per-record input projections and the result.

use std::path::{Path, PathBuf};

use gwasbench_core::cancel::CancellationToken;
use gwasbench_core::error::BenchError;

use crate::command::CommandSpec;
use crate::process::{ServiceProcess, ServiceSpec};

/// Flat value files the provider reads: genotype counts and two covariate columns.
pub const DEFAULT_PROJECTIONS: [&str; 3] = ["alleles-demo.tsv", "PurpleHair.tsv", "isFemale.tsv"];

/// Run the exporter in `staging_dir` and block until it finishes.
pub fn run_exporter(
    exporter: &CommandSpec,
    staging_dir: &Path,
    log_dir: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<(), BenchError> {
    let spec = ServiceSpec {
        name: "exporter".into(),
        command: exporter.clone(),
        working_dir: staging_dir.to_path_buf(),
        log_dir: log_dir.map(Path::to_path_buf),
    };
    ServiceProcess::spawn(&spec)?.wait(cancel, None)?;
    Ok(())
}

/// Paths of every projection in `staging_dir`, failing on the first missing one.
pub fn locate_projections(staging_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>, BenchError> {
    names
        .iter()
        .map(|name| {
            let path = staging_dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(BenchError::MissingArtifact(path))
            }
        })
        .collect()
}

/// Move `src` to `dst`, creating the parent directory and replacing any
/// existing file. Falls back to copy-and-remove when a rename is not
/// possible (e.g. across filesystems).
pub fn relocate(src: &Path, dst: &Path) -> Result<(), BenchError> {
    if !src.is_file() {
        return Err(BenchError::MissingArtifact(src.to_path_buf()));
    }
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
    }
    if std::fs::rename(src, dst).is_err() {
        std::fs::copy(src, dst).map_err(|e| BenchError::io(dst, e))?;
        std::fs::remove_file(src).map_err(|e| BenchError::io(src, e))?;
    }
    tracing::debug!(from = %src.display(), to = %dst.display(), "relocated");
    Ok(())
}

/// Move every projection from `staging_dir` into `data_dir`.
pub fn stage_projections(
    staging_dir: &Path,
    data_dir: &Path,
    names: &[String],
) -> Result<Vec<PathBuf>, BenchError> {
    let sources = locate_projections(staging_dir, names)?;
    let mut staged = Vec::with_capacity(sources.len());
    for (src, name) in sources.iter().zip(names) {
        let dst = data_dir.join(name);
        relocate(src, &dst)?;
        staged.push(dst);
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names() -> Vec<String> {
        DEFAULT_PROJECTIONS.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn stage_moves_all_projections() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("hail_demo");
        let data = dir.path().join("dpi/dpi_data");
        std::fs::create_dir_all(&staging).unwrap();
        for name in DEFAULT_PROJECTIONS {
            std::fs::write(staging.join(name), format!("{name}\n1\n0\n")).unwrap();
        }

        let staged = stage_projections(&staging, &data, &names()).unwrap();
        assert_eq!(staged.len(), 3);
        for name in DEFAULT_PROJECTIONS {
            assert!(!staging.join(name).exists());
            assert_eq!(
                std::fs::read_to_string(data.join(name)).unwrap(),
                format!("{name}\n1\n0\n")
            );
        }
    }

    #[test]
    fn missing_projection_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("alleles-demo.tsv"), "x").unwrap();
        let err = stage_projections(dir.path(), &dir.path().join("data"), &names()).unwrap_err();
        match err {
            BenchError::MissingArtifact(path) => assert!(path.ends_with("PurpleHair.tsv")),
            other => panic!("unexpected error: {other}"),
        }
        // Nothing is moved when a projection is missing.
        assert!(dir.path().join("alleles-demo.tsv").exists());
    }

    #[test]
    fn relocate_replaces_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("results.out");
        let dst = dir.path().join("out/SECRET_results.vcf");
        std::fs::create_dir_all(dst.parent().unwrap()).unwrap();
        std::fs::write(&dst, "stale").unwrap();
        std::fs::write(&src, "fresh").unwrap();
        relocate(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "fresh");
        assert!(!src.exists());
    }

    #[cfg(unix)]
    #[test]
    fn exporter_runs_in_staging_dir() {
        let dir = TempDir::new().unwrap();
        let exporter = CommandSpec::new("sh")
            .arg("-c")
            .arg("printf 1 > alleles-demo.tsv; printf 0 > PurpleHair.tsv; printf 1 > isFemale.tsv");
        run_exporter(&exporter, dir.path(), None, &CancellationToken::new()).unwrap();
        assert_eq!(locate_projections(dir.path(), &names()).unwrap().len(), 3);
    }
}
