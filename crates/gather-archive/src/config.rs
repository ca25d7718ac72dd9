//! Filter configuration for an archive run.

use chrono::{DateTime, Utc};
use gather_tail::{deadline_from, ScanOptions};
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};

/// How logs are bounded during a run. At most one criterion is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Archive every file as is.
    #[default]
    None,
    /// Keep the newest `N` lines of each log.
    Lines(usize),
    /// Keep lines from the last `M` minutes before the reference time.
    Since(u32),
}

/// What to do with a journal dump that ended before the deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleJournalPolicy {
    /// Archive the dump unfiltered.
    #[default]
    Keep,
    /// Archive the dump as an empty file.
    Truncate,
}

/// Configuration consumed by the archiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Active filter criterion.
    pub mode: FilterMode,
    /// Point in time the `Since` window is measured back from.
    pub reference_time: DateTime<Utc>,
    /// Handling of journal dumps older than the window.
    pub stale_journals: StaleJournalPolicy,
    /// Scanner tuning.
    pub scan: ScanOptions,
}

impl FilterConfig {
    /// Creates a config with the given mode and reference time.
    #[must_use]
    pub fn new(mode: FilterMode, reference_time: DateTime<Utc>) -> Self {
        Self {
            mode,
            reference_time,
            stale_journals: StaleJournalPolicy::default(),
            scan: ScanOptions::default(),
        }
    }

    /// Builds a config from the `--lines` and `--since` flags, zero meaning unset.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Config`] if both criteria are set.
    pub fn from_flags(
        lines: Option<usize>,
        since_minutes: Option<u32>,
        reference_time: DateTime<Utc>,
    ) -> Result<Self> {
        let mode = match (lines.filter(|n| *n > 0), since_minutes.filter(|m| *m > 0)) {
            (Some(_), Some(_)) => {
                return Err(ArchiveError::Config(
                    "not possible to filter by time and number of lines".into(),
                ));
            }
            (Some(lines), None) => FilterMode::Lines(lines),
            (None, Some(minutes)) => FilterMode::Since(minutes),
            (None, None) => FilterMode::None,
        };
        Ok(Self::new(mode, reference_time))
    }

    /// Sets the stale journal policy.
    #[must_use]
    pub const fn with_stale_journals(mut self, policy: StaleJournalPolicy) -> Self {
        self.stale_journals = policy;
        self
    }

    /// Sets the scanner options.
    #[must_use]
    pub const fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    /// Returns the time deadline when filtering by time.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.mode {
            FilterMode::Since(minutes) => Some(deadline_from(self.reference_time, minutes)),
            FilterMode::None | FilterMode::Lines(_) => None,
        }
    }

    /// Returns true if no filtering is configured.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self.mode, FilterMode::None)
    }
}
