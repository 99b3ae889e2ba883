//! Output validator: numeric agreement between a computed result stream
//! and a reference stream.
//!
//! Rows are aligned by position. The reference stream starts with one
//! header line, the computed stream does not. Column 5 (index 4) of every
//! row carries the statistic being compared.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::{DISPLAY_DIGITS, STATISTIC_FIELD};
use crate::error::BenchError;

/// What to do when the two streams have different row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Fail with [`BenchError::LengthMismatch`].
    #[default]
    Strict,
    /// Compare the overlapping prefix and flag the report as truncated.
    AllowTruncation,
}

/// One parsed line of a result stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    /// 1-based physical line number in the source.
    pub line: usize,
    pub statistic: f64,
}

impl ResultRow {
    /// Parse a tab-separated line, extracting the statistic column.
    pub fn parse(text: &str, line: usize) -> Result<Self, String> {
        let mut fields = text.split('\t');
        let Some(raw) = fields.nth(STATISTIC_FIELD) else {
            return Err(format!(
                "expected at least {} tab-separated fields, found {}",
                STATISTIC_FIELD + 1,
                text.split('\t').count()
            ));
        };
        let statistic: f64 = raw
            .trim()
            .parse()
            .map_err(|_| format!("statistic {raw:?} is not a number"))?;
        if !statistic.is_finite() {
            return Err(format!("statistic {raw:?} is not finite"));
        }
        Ok(Self { line, statistic })
    }
}

/// Reads rows from one stream, tracking line numbers for diagnostics.
struct RowReader<R> {
    source: PathBuf,
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> RowReader<R> {
    fn new(reader: R, source: &Path, skip_header: bool) -> Result<Self, BenchError> {
        let mut this = Self {
            source: source.to_path_buf(),
            lines: reader.lines(),
            line: 0,
        };
        if skip_header {
            this.next_line()?;
        }
        Ok(this)
    }

    fn next_line(&mut self) -> Result<Option<String>, BenchError> {
        match self.lines.next() {
            Some(Ok(text)) => {
                self.line += 1;
                Ok(Some(text))
            }
            Some(Err(e)) => Err(BenchError::io(&self.source, e)),
            None => Ok(None),
        }
    }

    fn next_row(&mut self) -> Result<Option<ResultRow>, BenchError> {
        while let Some(text) = self.next_line()? {
            if text.trim().is_empty() {
                continue;
            }
            return ResultRow::parse(&text, self.line)
                .map(Some)
                .map_err(|message| BenchError::Parse {
                    path: self.source.clone(),
                    line: self.line,
                    message,
                });
        }
        Ok(None)
    }

    /// Count the remaining non-blank lines without parsing them.
    fn count_remaining(&mut self) -> Result<usize, BenchError> {
        let mut count = 0;
        while let Some(text) = self.next_line()? {
            if !text.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Aggregate discrepancy between two aligned statistic sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscrepancyReport {
    pub rows_compared: usize,
    pub computed_rows: usize,
    pub reference_rows: usize,
    pub mean_abs_diff: f64,
    pub max_abs_diff: f64,
    /// 0-based position of the first row reaching the maximum.
    pub max_diff_row: usize,
    /// True when the streams differed in length and only the overlap was compared.
    pub truncated: bool,
}

impl DiscrepancyReport {
    #[must_use]
    pub fn rounded_mean(&self) -> f64 {
        round_to(self.mean_abs_diff, DISPLAY_DIGITS)
    }

    #[must_use]
    pub fn rounded_max(&self) -> f64 {
        round_to(self.max_abs_diff, DISPLAY_DIGITS)
    }

    /// Fail if the maximum difference exceeds `tolerance`, which must be
    /// finite and non-negative.
    pub fn check_tolerance(&self, tolerance: f64) -> Result<(), BenchError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(BenchError::Config(format!(
                "tolerance must be a finite, non-negative number, got {tolerance}"
            )));
        }
        if self.max_abs_diff > tolerance {
            Err(BenchError::ToleranceExceeded {
                max: self.max_abs_diff,
                tolerance,
            })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for DiscrepancyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average difference in Z stat {}", self.rounded_mean())?;
        write!(f, "Maximum difference in Z stat {}", self.rounded_max())?;
        if self.truncated {
            write!(
                f,
                "\nCompared only the first {} rows (computed: {}, reference: {})",
                self.rows_compared, self.computed_rows, self.reference_rows
            )?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Accumulator {
    rows: usize,
    sum: f64,
    max: f64,
    max_row: usize,
}

impl Accumulator {
    fn push(&mut self, a: f64, b: f64) {
        let diff = (a - b).abs();
        if diff > self.max {
            self.max = diff;
            self.max_row = self.rows;
        }
        self.sum += diff;
        self.rows += 1;
    }
}

/// Round `value` to `digits` decimal places.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Compare two streams. `reference` has one header line that is skipped.
pub fn compare_streams<A: BufRead, B: BufRead>(
    computed: A,
    computed_source: &Path,
    reference: B,
    reference_source: &Path,
    policy: LengthPolicy,
) -> Result<DiscrepancyReport, BenchError> {
    let mut computed = RowReader::new(computed, computed_source, false)?;
    let mut reference = RowReader::new(reference, reference_source, true)?;

    let mut acc = Accumulator::default();
    let (mut computed_extra, mut reference_extra) = (0, 0);
    // Rows past the shorter stream are counted, never parsed.
    loop {
        let Some(c) = computed.next_row()? else {
            reference_extra = reference.count_remaining()?;
            break;
        };
        let Some(r) = reference.next_row()? else {
            computed_extra = 1 + computed.count_remaining()?;
            break;
        };
        acc.push(c.statistic, r.statistic);
    }

    let computed_rows = acc.rows + computed_extra;
    let reference_rows = acc.rows + reference_extra;
    let truncated = computed_rows != reference_rows;

    if truncated && policy == LengthPolicy::Strict {
        return Err(BenchError::LengthMismatch {
            computed: computed_rows,
            reference: reference_rows,
        });
    }
    if acc.rows == 0 {
        return Err(BenchError::EmptyComparison);
    }
    if truncated {
        tracing::warn!(
            computed_rows,
            reference_rows,
            compared = acc.rows,
            "result streams differ in length, comparing the overlapping prefix"
        );
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = (acc.sum / acc.rows as f64).min(acc.max);

    Ok(DiscrepancyReport {
        rows_compared: acc.rows,
        computed_rows,
        reference_rows,
        mean_abs_diff: mean,
        max_abs_diff: acc.max,
        max_diff_row: acc.max_row,
        truncated,
    })
}

/// Compare the result file at `computed` with the reference file at `reference`.
pub fn validate_files(
    computed: &Path,
    reference: &Path,
    policy: LengthPolicy,
) -> Result<DiscrepancyReport, BenchError> {
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| BenchError::io(path, e))
    };
    let report = compare_streams(open(computed)?, computed, open(reference)?, reference, policy)?;
    tracing::debug!(rows = report.rows_compared, max = report.max_abs_diff, "validated results");
    Ok(report)
}
