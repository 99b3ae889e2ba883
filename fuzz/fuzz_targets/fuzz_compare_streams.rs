#![no_main]

use std::io::Cursor;
use std::path::Path;

use libfuzzer_sys::fuzz_target;

use gwasbench_core::validator::{compare_streams, LengthPolicy};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the split point between the two streams.
    let split = usize::from(data[0]) % data.len();
    let (computed, reference) = data[1..].split_at(split.min(data.len() - 1));

    for policy in [LengthPolicy::Strict, LengthPolicy::AllowTruncation] {
        if let Ok(report) = compare_streams(
            Cursor::new(computed),
            Path::new("computed"),
            Cursor::new(reference),
            Path::new("reference"),
            policy,
        ) {
            assert!(report.rows_compared > 0);
            assert!(report.mean_abs_diff <= report.max_abs_diff);
            assert!(report.rows_compared <= report.computed_rows.min(report.reference_rows));
        }
    }
});
