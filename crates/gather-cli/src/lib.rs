//! # gather-cli
//!
//! Command-line front end of the must-gather compressor.
//!
//! Turns flags into a [`FilterConfig`] and [`ClassificationRules`], runs the
//! [`Archiver`] and prints an [`output::RunReport`].
//!
//! ```text
//! gather --src must-gather --dst must-gather.tar.gz --since 60
//! gather --src must-gather --lines 500 --exempt audit --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod output;
pub mod termination;

use std::io::Write;

use chrono::Utc;
use gather_archive::{Archiver, ClassificationRules, FilterConfig, StaleJournalPolicy};

pub use cli::{Cli, Format};
pub use error::CliError;
pub use output::{OutputFormat, RunReport, TableDisplay};

/// Builds the archiver described by the command line.
///
/// # Errors
///
/// Returns an error if both filters are set or the rules file is unusable.
pub fn build_archiver(cli: &Cli) -> Result<Archiver, CliError> {
    let reference = cli.reference_time.unwrap_or_else(Utc::now);
    let mut config = FilterConfig::from_flags(cli.lines, cli.since, reference)?;
    if cli.truncate_stale_journals {
        config = config.with_stale_journals(StaleJournalPolicy::Truncate);
    }

    let rules = match &cli.rules {
        Some(path) => ClassificationRules::load(path).map_err(|e| {
            CliError::Config(format!("cannot load rules from {}: {e}", path.display()))
        })?,
        None => ClassificationRules::default(),
    };

    Ok(Archiver::new(config, rules.with_exemptions(cli.exempt.iter().cloned())))
}

/// Archives `cli.src` into `cli.dst` and writes the report to `out`.
///
/// # Errors
///
/// Returns an error if configuration, archiving or output fails.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<RunReport, CliError> {
    let archiver = build_archiver(cli)?;
    let summary = archiver.archive(&cli.src, &cli.dst)?;

    let report = RunReport::new(&cli.dst, archiver.config().mode, summary);
    OutputFormat::new(cli.format).write(out, &report)?;
    Ok(report)
}
