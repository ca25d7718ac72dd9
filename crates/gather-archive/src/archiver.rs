//! Selective tar.gz archiving of a must-gather tree.
//!
//! The archiver walks the source tree in name order. Each regular file is
//! classified, truncated in place to its retained tail when a predicate
//! applies, re-stated, and streamed into a gzip-compressed tar under its path
//! relative to the source root. Filtering failures never abort the run: the
//! file is logged and archived as found.

use std::fs::{self, File};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use gather_tail::{
    deadline_from, resolve_journal_predicate, tail_file_with, FilterError, LineCountPredicate,
    StopPredicate, TailReport, TimestampPredicate,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::{ClassificationRules, LogKind};
use crate::config::{FilterConfig, FilterMode, StaleJournalPolicy};
use crate::error::{ArchiveError, Result};

/// Counters describing a finished archive run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Regular files stored.
    pub files: usize,
    /// Directories stored.
    pub directories: usize,
    /// Symbolic links stored.
    pub symlinks: usize,
    /// Files a predicate was applied to.
    pub filtered: usize,
    /// Filtered files whose content was actually cut.
    pub truncated: usize,
    /// Relative paths whose filtering failed and which were stored unfiltered.
    ///
    /// Journal dumps retained whole, header included, are not failures.
    pub failed: Vec<String>,
    /// Total size of stored files before filtering.
    pub bytes_before: u64,
    /// Total size of stored files as archived.
    pub bytes_after: u64,
}

/// Chooses the predicate for a file of the given kind.
///
/// Returns `Ok(None)` when the file is to be archived unfiltered. An empty
/// journal dump has no header to resolve and is left as is.
///
/// # Errors
///
/// Returns an error if the journal header of `path` cannot be resolved.
pub fn select_predicate(
    kind: LogKind,
    config: &FilterConfig,
    path: &Path,
) -> std::result::Result<Option<Box<dyn StopPredicate>>, FilterError> {
    let predicate: Box<dyn StopPredicate> = match (config.mode, kind) {
        (FilterMode::None, _) | (_, LogKind::Exempt) => return Ok(None),
        (FilterMode::Lines(limit), LogKind::Journal | LogKind::Plain) => {
            Box::new(LineCountPredicate::new(limit))
        }
        (FilterMode::Since(minutes), LogKind::Plain) => Box::new(TimestampPredicate::new(
            deadline_from(config.reference_time, minutes),
        )),
        (FilterMode::Since(_), LogKind::Journal) if fs::metadata(path)?.len() == 0 => {
            return Ok(None);
        }
        (FilterMode::Since(minutes), LogKind::Journal) => {
            let deadline = deadline_from(config.reference_time, minutes);
            match (resolve_journal_predicate(path, deadline)?, config.stale_journals) {
                (Some(predicate), _) => Box::new(predicate),
                (None, StaleJournalPolicy::Keep) => return Ok(None),
                (None, StaleJournalPolicy::Truncate) => Box::new(LineCountPredicate::new(0)),
            }
        }
    };
    Ok(Some(predicate))
}

/// Builds must-gather archives.
#[derive(Debug, Clone)]
pub struct Archiver {
    config: FilterConfig,
    rules: ClassificationRules,
}

impl Archiver {
    /// Creates an archiver.
    #[must_use]
    pub const fn new(config: FilterConfig, rules: ClassificationRules) -> Self {
        Self { config, rules }
    }

    /// Returns the filter configuration.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Archives `source` into the gzip-compressed tar `destination`.
    ///
    /// Files under `source` selected for filtering are truncated in place
    /// before being archived.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a directory, the tree cannot be
    /// walked or read, or the archive cannot be written.
    pub fn archive(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<ArchiveSummary> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        if !source.is_dir() {
            return Err(ArchiveError::Config(format!(
                "source {} is not a directory",
                source.display()
            )));
        }

        let output = File::create(destination)?;
        let destination = fs::canonicalize(destination)?;
        let mut builder = tar::Builder::new(GzEncoder::new(output, Compression::default()));
        builder.follow_symlinks(false);

        info!(
            source = %source.display(),
            destination = %destination.display(),
            mode = ?self.config.mode,
            "archiving must-gather tree"
        );

        let mut summary = ArchiveSummary::default();
        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            let relative = path.strip_prefix(source).map_err(|_| {
                ArchiveError::Config(format!("{} escapes the source tree", path.display()))
            })?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                builder.append_dir(relative, path)?;
                summary.directories += 1;
            } else if file_type.is_symlink() {
                builder.append_path_with_name(path, relative)?;
                summary.symlinks += 1;
            } else if file_type.is_file() {
                if is_same_file(path, &destination) {
                    debug!(path = %relative.display(), "skipping the archive being written");
                    continue;
                }
                summary.bytes_before += entry.metadata()?.len();
                self.filter_file(relative, path, &mut summary);

                // reopen so the header reflects the truncated size and mtime
                let mut file = File::open(path)?;
                summary.bytes_after += file.metadata()?.len();
                builder.append_file(relative, &mut file)?;
                summary.files += 1;
            } else {
                warn!(path = %relative.display(), "skipping special file");
            }
        }

        builder.into_inner()?.finish()?.sync_all()?;

        info!(
            files = summary.files,
            filtered = summary.filtered,
            truncated = summary.truncated,
            failed = summary.failed.len(),
            bytes_before = summary.bytes_before,
            bytes_after = summary.bytes_after,
            "archive complete"
        );
        Ok(summary)
    }

    /// Applies the configured filter to one file, recording the outcome.
    fn filter_file(&self, relative: &Path, path: &Path, summary: &mut ArchiveSummary) {
        let Some(kind) = self.rules.classify(relative) else {
            return;
        };
        if kind == LogKind::Exempt {
            debug!(path = %relative.display(), "exempt from filtering");
            return;
        }

        match self.apply(kind, path) {
            Ok(Some(report)) => {
                summary.filtered += 1;
                if report.rewritten {
                    summary.truncated += 1;
                }
                debug!(
                    path = %relative.display(),
                    ?kind,
                    retained = report.retained,
                    stop = ?report.stop,
                    "filtered"
                );
            }
            Ok(None) => {}
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "filtering failed, archiving unfiltered");
                summary.failed.push(relative.display().to_string());
            }
        }
    }

    fn apply(&self, kind: LogKind, path: &Path) -> std::result::Result<Option<TailReport>, FilterError> {
        let Some(predicate) = select_predicate(kind, &self.config, path)? else {
            return Ok(None);
        };
        tail_file_with(path, predicate.as_ref(), &self.config.scan).map(Some)
    }
}

fn is_same_file(path: &Path, canonical: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|p| p == canonical)
}
