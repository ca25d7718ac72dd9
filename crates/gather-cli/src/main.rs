//! `gather` binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gather_cli::cli::Cli;
use gather_cli::termination::write_termination_log;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Filtering failures are logged at warn and must stay visible by default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            eprintln!("Error: {message}");
            if let Some(path) = &cli.termination_log {
                if let Err(write_err) = write_termination_log(path, &message) {
                    tracing::error!(path = %path.display(), error = %write_err, "failed to write termination log");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    gather_cli::run(cli, &mut stdout)
        .with_context(|| format!("failed to archive {}", cli.src.display()))?;
    Ok(())
}
