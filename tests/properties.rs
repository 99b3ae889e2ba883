//! Property-based tests for the grid, the generated configs, and the validator.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use proptest::prelude::*;

use gwasbench_core::config::{ConfigTemplate, PortPolicy};
use gwasbench_core::generator::MatrixGenerator;
use gwasbench_core::layout::ArtifactLayout;
use gwasbench_core::point::{ExperimentGrid, ExperimentPoint, GridRange};
use gwasbench_core::validator::{compare_streams, DiscrepancyReport, LengthPolicy};
use gwasbench_tests::result_stream;

fn compare(computed: &[f64], reference: &[f64]) -> DiscrepancyReport {
    compare_streams(
        Cursor::new(result_stream(computed, false)),
        Path::new("computed"),
        Cursor::new(result_stream(reference, true)),
        Path::new("reference"),
        LengthPolicy::Strict,
    )
    .unwrap()
}

fn statistic() -> impl Strategy<Value = f64> {
    -50.0f64..50.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Covariants are `"1-scale".."f-scale"` in order with no trailing element.
    #[test]
    fn covariants_match_feature_count(scale in 1u64..10_000_000, features in 1u32..=16) {
        let point = ExperimentPoint::new(scale, features).unwrap();
        let covariants = point.covariates();
        prop_assert_eq!(covariants.len(), features as usize);
        for (i, c) in covariants.iter().enumerate() {
            prop_assert_eq!(c, &format!("{}-{scale}", i + 1));
        }
    }

    /// Distinct points never share a compute config path.
    #[test]
    fn compute_paths_are_unique(
        scale_start in 1u64..1_000,
        scale_step in 1u64..500,
        scale_count in 1u64..8,
        features_end in 2u64..=17,
    ) {
        let grid = ExperimentGrid::new(
            GridRange::new(scale_start, scale_start + scale_step * scale_count, scale_step).unwrap(),
            GridRange::new(1, features_end, 1).unwrap(),
        )
        .unwrap();
        let layout = ArtifactLayout::default();
        let paths: HashSet<_> = grid.points().map(|p| layout.compute_path(p)).collect();
        prop_assert_eq!(paths.len(), grid.len());
    }

    /// Under `PerPoint`, every compute config in the grid gets its own port.
    #[test]
    fn per_point_ports_are_distinct(scale_count in 1u64..6, features_end in 2u64..=17) {
        let grid = ExperimentGrid::new(
            GridRange::new(100_000, 100_000 * (scale_count + 1), 100_000).unwrap(),
            GridRange::new(1, features_end, 1).unwrap(),
        )
        .unwrap();
        let template = ConfigTemplate {
            port_policy: PortPolicy::PerPoint,
            ..ConfigTemplate::default()
        };
        let ports: HashSet<u16> = grid
            .points()
            .enumerate()
            .map(|(i, p)| template.compute_config(p, i).unwrap().enclave_node_bind_port)
            .collect();
        prop_assert_eq!(ports.len(), grid.len());
    }

    /// Planning twice yields identical contents.
    #[test]
    fn plan_is_deterministic(scale_count in 1u64..4, features_end in 2u64..6) {
        let grid = ExperimentGrid::new(
            GridRange::new(1_000, 1_000 * (scale_count + 1), 1_000).unwrap(),
            GridRange::new(1, features_end, 1).unwrap(),
        )
        .unwrap();
        let generator = MatrixGenerator::new(grid, ConfigTemplate::default(), ArtifactLayout::default());
        let first: Vec<String> = generator.plan().unwrap().iter().map(|a| a.contents()).collect();
        let second: Vec<String> = generator.plan().unwrap().iter().map(|a| a.contents()).collect();
        prop_assert_eq!(first, second);
    }

    /// Swapping the two streams leaves the discrepancy unchanged.
    #[test]
    fn validator_is_symmetric(pairs in prop::collection::vec((statistic(), statistic()), 1..40)) {
        let (a, b): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let forward = compare(&a, &b);
        let backward = compare(&b, &a);
        prop_assert_eq!(forward.max_abs_diff, backward.max_abs_diff);
        prop_assert_eq!(forward.mean_abs_diff, backward.mean_abs_diff);
        prop_assert_eq!(forward.max_diff_row, backward.max_diff_row);
    }

    /// 0 <= mean <= max.
    #[test]
    fn mean_is_bounded_by_max(pairs in prop::collection::vec((statistic(), statistic()), 1..40)) {
        let (a, b): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let report = compare(&a, &b);
        prop_assert!(report.mean_abs_diff >= 0.0);
        prop_assert!(report.mean_abs_diff <= report.max_abs_diff);
        prop_assert!(report.rounded_mean() <= report.rounded_max());
    }

    /// Identical streams have zero discrepancy.
    #[test]
    fn identical_streams_agree(values in prop::collection::vec(statistic(), 1..40)) {
        let report = compare(&values, &values);
        prop_assert_eq!(report.max_abs_diff, 0.0);
        prop_assert_eq!(report.rows_compared, values.len());
    }

    /// Differing lengths fail under the strict policy and are flagged otherwise.
    #[test]
    fn length_mismatch_is_never_silent(
        computed in prop::collection::vec(statistic(), 1..20),
        extra in 1usize..5,
    ) {
        let mut reference = computed.clone();
        reference.extend(std::iter::repeat(0.0).take(extra));
        let strict = compare_streams(
            Cursor::new(result_stream(&computed, false)),
            Path::new("computed"),
            Cursor::new(result_stream(&reference, true)),
            Path::new("reference"),
            LengthPolicy::Strict,
        );
        prop_assert!(strict.is_err());
        let lenient = compare_streams(
            Cursor::new(result_stream(&computed, false)),
            Path::new("computed"),
            Cursor::new(result_stream(&reference, true)),
            Path::new("reference"),
            LengthPolicy::AllowTruncation,
        )
        .unwrap();
        prop_assert!(lenient.truncated);
        prop_assert_eq!(lenient.rows_compared, computed.len());
        prop_assert_eq!(lenient.reference_rows, computed.len() + extra);
    }
}
