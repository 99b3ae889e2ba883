//! # gwasbench-cli
//!
//! Terminal presentation: report formatting, the run progress spinner,
//! and shell completion.

pub mod completion;
pub mod observer;
pub mod output;
pub mod presenter;
pub mod ui;

pub use observer::CliRunObserver;
pub use presenter::ReportPresenter;
