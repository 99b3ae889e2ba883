//! # gwasbench-core
//!
//! Core library for the gwasbench harness: the experiment grid, the
//! service configuration documents and their on-disk layout, the matrix
//! generator, and the output validator.

pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod layout;
pub mod point;
pub(crate) mod render;
pub mod validator;

// Re-exports
pub use cancel::CancellationToken;
pub use config::{
    AnalysisType, ComputeConfig, ConfigTemplate, CoordinationConfig, Endpoint, PortPolicy,
    ProviderConfig, ServiceConfig,
};
pub use constants::exit_codes;
pub use error::BenchError;
pub use generator::{GenerationSummary, MatrixGenerator};
pub use layout::ArtifactLayout;
pub use point::{ExperimentGrid, ExperimentPoint, GridRange};
pub use validator::{DiscrepancyReport, LengthPolicy, ResultRow};
