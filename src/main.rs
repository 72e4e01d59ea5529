//! Student Performance - Main Entry Point
//!
//! Preprocesses the student performance dataset from the command line.

use clap::Parser;
use student_performance::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_performance=info".into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli)
}
