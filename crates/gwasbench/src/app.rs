//! Application entry point and dispatch.

use std::path::Path;

use anyhow::{Context, Result};

use gwasbench_cli::completion::generate_completion;
use gwasbench_cli::observer::CliRunObserver;
use gwasbench_cli::presenter::ReportPresenter;
use gwasbench_core::cancel::CancellationToken;
use gwasbench_core::error::BenchError;
use gwasbench_core::generator::MatrixGenerator;
use gwasbench_core::validator::validate_files;
use gwasbench_orchestration::orchestrator::Orchestrator;

use crate::config::{AppConfig, Command, GenerateArgs, RunArgs, ValidateArgs};

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    match &config.command {
        Command::Generate(args) => run_generate(args, config.quiet),
        Command::Run(args) => run_experiment(args, config.quiet),
        Command::Validate(args) => run_validate(args, config.quiet),
        Command::Completion { shell } => {
            let mut cmd = <AppConfig as clap::CommandFactory>::command();
            generate_completion(&mut cmd, *shell, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_generate(args: &GenerateArgs, quiet: bool) -> Result<()> {
    let generator = MatrixGenerator::new(args.grid()?, args.template(), args.layout());
    let summary = if args.dry_run {
        generator.dry_run()?
    } else {
        generator.generate()?
    };
    ReportPresenter::new(quiet, false).present_generation(&summary, Path::new("."), args.dry_run);
    Ok(())
}

fn run_experiment(args: &RunArgs, quiet: bool) -> Result<()> {
    let plan = args.plan();
    if !plan.work_root.is_dir() {
        return Err(BenchError::MissingArtifact(plan.work_root.clone()).into());
    }

    let cancel = CancellationToken::new();
    ctrlc_handler(cancel.clone())?;

    let observer = CliRunObserver::new(quiet || args.json);
    let report = Orchestrator::new(plan, cancel, &observer)
        .run()
        .context("benchmark run failed")?;
    ReportPresenter::new(quiet, args.json).present_run(&report)?;
    Ok(())
}

fn run_validate(args: &ValidateArgs, quiet: bool) -> Result<()> {
    let report = validate_files(&args.computed, &args.reference, args.length_policy())?;
    ReportPresenter::new(quiet, args.json).present_discrepancy(&report)?;
    if let Some(tolerance) = args.tolerance {
        report.check_tolerance(tolerance)?;
    }
    Ok(())
}

fn ctrlc_handler(cancel: CancellationToken) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, stopping services");
        cancel.cancel();
    })
    .context("could not install Ctrl+C handler")
}
