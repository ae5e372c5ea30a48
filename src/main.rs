use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use perf_precommands::config::{Cli, Config};
use perf_precommands::error::PrepError;
use perf_precommands::logging::init_logger;
use perf_precommands::precommands::PreCommands;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Tool failures keep their exit code through any context layers
fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<PrepError>()
        .map(PrepError::exit_code)
        .unwrap_or(1)
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(cli)?;
    let operation = config.operation;
    debug!(
        root = %config.layout.root.display(),
        repo_root = %config.repo_root.display(),
        packages = %config.packages_dir.display(),
        "resolved scenario layout"
    );

    let mut pre = PreCommands::new(config);
    pre.prepare().context("Failed to prepare project")?;
    pre.execute()
        .with_context(|| format!("Failed to {operation} project"))?;

    Ok(())
}
