//! Presentation of command outcomes on stdout.

use std::fmt::Write as _;
use std::path::Path;

use gwasbench_core::generator::GenerationSummary;
use gwasbench_core::validator::DiscrepancyReport;
use gwasbench_orchestration::interfaces::RunReport;

use crate::output::{display_relative, format_count, format_duration};
use crate::ui::{header, status_word, Status};

/// Prints reports as text or JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPresenter {
    quiet: bool,
    json: bool,
    plain: bool,
}

impl ReportPresenter {
    #[must_use]
    pub fn new(quiet: bool, json: bool) -> Self {
        Self {
            quiet,
            json,
            plain: false,
        }
    }

    /// Disable styling regardless of the terminal.
    #[must_use]
    pub fn plain(mut self) -> Self {
        self.plain = true;
        self
    }

    /// The validator's two result lines, or the full report as JSON.
    pub fn discrepancy(&self, report: &DiscrepancyReport) -> serde_json::Result<String> {
        if self.json {
            return serde_json::to_string_pretty(report);
        }
        let mut out = report.to_string();
        if !self.quiet {
            if report.truncated {
                let _ = write!(out, " {}", status_word(Status::Warn, self.plain));
            }
            let _ = write!(
                out,
                "\nRows compared: {} (max at row {})",
                format_count(report.rows_compared),
                report.max_diff_row
            );
        }
        Ok(out)
    }

    pub fn present_discrepancy(&self, report: &DiscrepancyReport) -> serde_json::Result<()> {
        println!("{}", self.discrepancy(report)?);
        Ok(())
    }

    /// Counts of generated files; a dry run lists every path instead.
    #[must_use]
    pub fn generation(&self, summary: &GenerationSummary, base: &Path, dry_run: bool) -> String {
        let mut out = String::new();
        if dry_run {
            for path in &summary.paths {
                let _ = writeln!(out, "{}", display_relative(path, base));
            }
        }
        if !self.quiet {
            let verb = if dry_run { "Would write" } else { "Wrote" };
            let _ = write!(
                out,
                "{verb} {} files: {} provider, {} compute, {} coordination",
                summary.total(),
                summary.provider_files,
                summary.compute_files,
                summary.coordination_files
            );
        }
        out.trim_end().to_string()
    }

    pub fn present_generation(&self, summary: &GenerationSummary, base: &Path, dry_run: bool) {
        let text = self.generation(summary, base, dry_run);
        if !text.is_empty() {
            println!("{text}");
        }
    }

    /// Step timing table followed by the relocated result path.
    pub fn run(&self, report: &RunReport) -> serde_json::Result<String> {
        if self.json {
            return serde_json::to_string_pretty(report);
        }
        if self.quiet {
            return Ok(report.result_path.display().to_string());
        }
        let mut out = header("Run", self.plain);
        for timing in &report.steps {
            let _ = write!(
                out,
                "\n  {:<28} {:>12} {}",
                timing.step.label(),
                format_duration(timing.elapsed),
                status_word(Status::Ok, self.plain)
            );
        }
        let _ = write!(out, "\n{:-<60}", "");
        if let Some(compute) = report.compute_time() {
            let _ = write!(out, "\nCompute time: {}", format_duration(compute));
        }
        let _ = write!(
            out,
            "\nTotal: {}\nResult: {}",
            format_duration(report.total),
            report.result_path.display()
        );
        Ok(out)
    }

    pub fn present_run(&self, report: &RunReport) -> serde_json::Result<()> {
        println!("{}", self.run(report)?);
        Ok(())
    }
}
