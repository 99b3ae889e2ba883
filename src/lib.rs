//! Fixtures shared by the cross-crate integration tests.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// Header line of a reference result file.
pub const REFERENCE_HEADER: &str = "locus\talleles\trsid\tbeta\tt_stat";

/// A tab-separated result row carrying `statistic` in its fifth field.
#[must_use]
pub fn result_line(index: usize, statistic: f64) -> String {
    format!("1\t{}\trs{index}\tA\t{statistic:.6}", 10_000 + index)
}

/// Result stream text. The reference stream gets a header, the computed one does not.
#[must_use]
pub fn result_stream(statistics: &[f64], header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str(REFERENCE_HEADER);
        out.push('\n');
    }
    for (i, s) in statistics.iter().enumerate() {
        let _ = writeln!(out, "{}", result_line(i, *s));
    }
    out
}

/// Write a computed/reference pair into `dir` and return their paths.
pub fn write_result_pair(
    dir: &Path,
    computed: &[f64],
    reference: &[f64],
) -> io::Result<(PathBuf, PathBuf)> {
    let computed_path = dir.join("results.out");
    let reference_path = dir.join("reference.tsv");
    std::fs::write(&computed_path, result_stream(computed, false))?;
    std::fs::write(&reference_path, result_stream(reference, true))?;
    Ok((computed_path, reference_path))
}
