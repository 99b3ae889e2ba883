//! Experiment points and the grid they are drawn from.

use std::fmt;

use crate::constants::{
    DEFAULT_SCALE_END, DEFAULT_SCALE_START, DEFAULT_SCALE_STEP, MAX_FEATURE_COUNT,
    MIN_FEATURE_COUNT,
};
use crate::error::BenchError;

/// One grid cell: a record count and a covariate count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExperimentPoint {
    scale: u64,
    feature_count: u32,
}

impl ExperimentPoint {
    /// Create a point, rejecting a zero scale or a feature count outside 1..=16.
    pub fn new(scale: u64, feature_count: u32) -> Result<Self, BenchError> {
        if scale == 0 {
            return Err(BenchError::InvalidPoint("scale must be positive".into()));
        }
        if !(MIN_FEATURE_COUNT..=MAX_FEATURE_COUNT).contains(&feature_count) {
            return Err(BenchError::InvalidPoint(format!(
                "feature count {feature_count} outside {MIN_FEATURE_COUNT}..={MAX_FEATURE_COUNT}"
            )));
        }
        Ok(Self {
            scale,
            feature_count,
        })
    }

    /// Record count.
    #[must_use]
    pub fn scale(&self) -> u64 {
        self.scale
    }

    /// Covariate count.
    #[must_use]
    pub fn feature_count(&self) -> u32 {
        self.feature_count
    }

    /// Covariate identifiers `"1-<scale>" .. "<feature_count>-<scale>"`.
    #[must_use]
    pub fn covariates(&self) -> Vec<String> {
        (1..=self.feature_count)
            .map(|i| format!("{i}-{}", self.scale))
            .collect()
    }

    /// Outcome-variable label for this scale.
    #[must_use]
    pub fn outcome_label(&self) -> String {
        format!("disease-{}", self.scale)
    }
}

impl fmt::Display for ExperimentPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale={} features={}", self.scale, self.feature_count)
    }
}

/// Ascending range `start..end` walked with a fixed positive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    start: u64,
    end: u64,
    step: u64,
}

impl GridRange {
    /// Create a range; the step must be positive and the range non-empty.
    pub fn new(start: u64, end: u64, step: u64) -> Result<Self, BenchError> {
        if step == 0 {
            return Err(BenchError::Config("range step must be positive".into()));
        }
        if start >= end {
            return Err(BenchError::Config(format!(
                "empty range {start}..{end}"
            )));
        }
        Ok(Self { start, end, step })
    }

    /// Iterate the range values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = u64> {
        let (step, end) = (self.step, self.end);
        std::iter::successors(Some(self.start), move |v| v.checked_add(step))
            .take_while(move |v| *v < end)
    }

    /// Number of values in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().count()
    }

    /// Always false: empty ranges are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for GridRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} step {}", self.start, self.end, self.step)
    }
}

/// Cartesian product of a scale range and a feature-count range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentGrid {
    scales: Vec<u64>,
    feature_counts: Vec<u32>,
}

impl ExperimentGrid {
    /// Build a grid, validating every value against the point bounds.
    pub fn new(scales: GridRange, feature_counts: GridRange) -> Result<Self, BenchError> {
        let feature_counts = feature_counts
            .values()
            .map(|f| {
                u32::try_from(f)
                    .map_err(|_| BenchError::InvalidPoint(format!("feature count {f} too large")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let scales: Vec<u64> = scales.values().collect();

        // Every combination is valid iff every axis value is.
        for &scale in &scales {
            for &features in &feature_counts {
                ExperimentPoint::new(scale, features)?;
            }
        }

        Ok(Self {
            scales,
            feature_counts,
        })
    }

    /// Scales in ascending order.
    #[must_use]
    pub fn scales(&self) -> &[u64] {
        &self.scales
    }

    /// Feature counts in ascending order.
    #[must_use]
    pub fn feature_counts(&self) -> &[u32] {
        &self.feature_counts
    }

    /// Points in scale-major, feature-count-minor order.
    pub fn points(&self) -> impl Iterator<Item = ExperimentPoint> + '_ {
        self.scales.iter().flat_map(move |&scale| {
            self.feature_counts.iter().map(move |&feature_count| ExperimentPoint {
                scale,
                feature_count,
            })
        })
    }

    /// Number of points in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scales.len() * self.feature_counts.len()
    }

    /// Whether the grid has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExperimentGrid {
    fn default() -> Self {
        let scales = GridRange {
            start: DEFAULT_SCALE_START,
            end: DEFAULT_SCALE_END,
            step: DEFAULT_SCALE_STEP,
        };
        Self {
            scales: scales.values().collect(),
            feature_counts: (MIN_FEATURE_COUNT..=MAX_FEATURE_COUNT).collect(),
        }
    }
}
