#![no_main]

use libfuzzer_sys::fuzz_target;

use gwasbench_core::validator::ResultRow;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Either a finite statistic or an error message, never a panic.
    if let Ok(row) = ResultRow::parse(text, 1) {
        assert!(row.statistic.is_finite());
    }
});
