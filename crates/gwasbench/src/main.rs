//! gwasbench: benchmark harness for a distributed GWAS service.

use gwasbench_lib::{app, config, errors};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = config::AppConfig::parse();

    // RUST_LOG wins over -v / -q.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(config.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = app::run(&config) {
        eprintln!("Error: {err:#}");
        std::process::exit(errors::exit_code(&err));
    }
}
