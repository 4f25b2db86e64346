use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use bookdb::{RunConfig, pipeline};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = RunConfig::parse();

    // A failed build still lets the report run against an earlier snapshot
    if let Err(e) = pipeline::build_snapshot(&config) {
        tracing::error!("Failed to build snapshot: {e}");
    }

    if config.pause {
        println!();
        println!("Press Enter to run the search");
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("Could not flush stdout: {e}");
        }
        if let Err(e) = io::stdin().lock().read_line(&mut String::new()) {
            tracing::warn!("Could not read from stdin: {e}");
        }
    }

    let mut out = io::stdout().lock();
    match pipeline::run_search_report(&config, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to run search report: {e}");
            ExitCode::FAILURE
        }
    }
}
