//! # gwasbench-orchestration
//!
//! Drives one benchmark run: stages the input projections, starts the
//! coordination server and the provider, runs the compute node to
//! completion, and collects its result.

pub mod command;
pub mod interfaces;
pub mod orchestrator;
pub mod plan;
pub mod process;
pub mod readiness;
pub mod staging;

pub use command::CommandSpec;
pub use interfaces::{NoOpObserver, RunObserver, RunReport, RunStep};
pub use orchestrator::Orchestrator;
pub use plan::{ComputeMode, ReadinessMode, RunPlan};
pub use readiness::ReadinessProbe;
