//! Golden file integration tests.
//!
//! Generates the 2x2 grid and compares every file byte-for-byte against
//! tests/testdata/golden.

use std::path::Path;

use tempfile::TempDir;

use gwasbench_core::config::ConfigTemplate;
use gwasbench_core::generator::MatrixGenerator;
use gwasbench_core::layout::ArtifactLayout;
use gwasbench_core::point::{ExperimentGrid, GridRange};
use gwasbench_core::validator::{validate_files, LengthPolicy};
use gwasbench_tests::write_result_pair;

fn golden_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/testdata/golden"))
}

fn two_by_two() -> ExperimentGrid {
    ExperimentGrid::new(
        GridRange::new(100_000, 300_000, 100_000).unwrap(),
        GridRange::new(1, 3, 1).unwrap(),
    )
    .unwrap()
}

#[test]
fn generated_files_match_golden() {
    let dir = TempDir::new().unwrap();
    let summary = MatrixGenerator::new(
        two_by_two(),
        ConfigTemplate::default(),
        ArtifactLayout::under(dir.path()),
    )
    .generate()
    .unwrap();

    assert_eq!(summary.provider_files, 2);
    assert_eq!(summary.compute_files, 4);
    for path in &summary.paths {
        let name = path.file_name().unwrap();
        let expected = std::fs::read(golden_dir().join(name))
            .unwrap_or_else(|e| panic!("missing golden file {}: {e}", name.to_string_lossy()));
        let actual = std::fs::read(path).unwrap();
        assert_eq!(
            String::from_utf8_lossy(&actual),
            String::from_utf8_lossy(&expected),
            "{} differs from golden",
            name.to_string_lossy()
        );
    }
}

#[test]
fn every_golden_file_is_generated() {
    let dir = TempDir::new().unwrap();
    let summary = MatrixGenerator::new(
        two_by_two(),
        ConfigTemplate::default(),
        ArtifactLayout::under(dir.path()),
    )
    .dry_run()
    .unwrap();
    let mut generated: Vec<String> = summary
        .paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let mut golden: Vec<String> = std::fs::read_dir(golden_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    generated.sort();
    golden.sort();
    assert_eq!(generated, golden);
}

#[test]
fn validator_on_written_files() {
    let dir = TempDir::new().unwrap();
    let (computed, reference) =
        write_result_pair(dir.path(), &[1.6, -2.25, 0.5], &[1.5, -2.0, 0.5]).unwrap();
    let report = validate_files(&computed, &reference, LengthPolicy::Strict).unwrap();
    assert_eq!(report.rows_compared, 3);
    assert_eq!(report.rounded_max(), 0.25);
    assert_eq!(report.max_diff_row, 1);
    assert_eq!(report.rounded_mean(), 0.116_667);
}
