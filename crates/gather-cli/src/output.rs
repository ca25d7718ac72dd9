//! Output formatting for the archive summary.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;
use std::path::Path;

use gather_archive::{ArchiveSummary, FilterMode};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of one archiving run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Archive written.
    pub archive: String,
    /// Filter applied to log files.
    pub filter: FilterMode,
    /// Entry and byte counts.
    #[serde(flatten)]
    pub summary: ArchiveSummary,
}

impl RunReport {
    /// Builds a report for `archive`.
    #[must_use]
    pub fn new(archive: &Path, filter: FilterMode, summary: ArchiveSummary) -> Self {
        Self {
            archive: archive.display().to_string(),
            filter,
            summary,
        }
    }
}

impl TableDisplay for RunReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let filter = match self.filter {
            FilterMode::None => "none".to_string(),
            FilterMode::Lines(n) => format!("last {n} lines"),
            FilterMode::Since(m) => format!("last {m} minutes"),
        };
        let s = &self.summary;

        writeln!(writer, "Archive Summary")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Archive:          {}", self.archive)?;
        writeln!(writer, "Filter:           {filter}")?;
        writeln!(writer)?;
        writeln!(writer, "Entries")?;
        writeln!(writer, "  Files:          {}", s.files)?;
        writeln!(writer, "  Directories:    {}", s.directories)?;
        writeln!(writer, "  Symlinks:       {}", s.symlinks)?;
        writeln!(writer)?;
        writeln!(writer, "Logs")?;
        writeln!(writer, "  Filtered:       {}", s.filtered)?;
        writeln!(writer, "  Truncated:      {}", s.truncated)?;
        writeln!(writer, "  Bytes before:   {}", s.bytes_before)?;
        writeln!(writer, "  Bytes after:    {}", s.bytes_after)?;

        if !s.failed.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Archived unfiltered ({})", s.failed.len())?;
            for path in &s.failed {
                writeln!(writer, "  {path}")?;
            }
        }
        Ok(())
    }
}
