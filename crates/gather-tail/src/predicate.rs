//! Stop predicates consulted by the backward scanner.
//!
//! This module provides:
//! - [`StopPredicate`]: The contract between the scanner and a filter
//! - [`LineCountPredicate`]: Keeps the newest `N` lines
//! - [`TimestampPredicate`]: Keeps lines stamped with RFC3339 at or after a deadline
//! - [`JournalTimestampPredicate`]: Same, for journal dumps with partial timestamps
//!
//! A predicate only ever sees fully reconstructed lines in forward order,
//! without the trailing newline.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FilterError, Result};

/// Partial journal timestamp, e.g. `Sep 26 13:55:00`.
static JOURNAL_LINE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\b",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// Decision taken by a predicate for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the line and continue with the next older one.
    Retain,
    /// Discard the line and everything older.
    Stop,
}

impl Verdict {
    /// Maps a boolean stop signal to a verdict.
    #[must_use]
    pub const fn stop_if(stop: bool) -> Self {
        if stop { Self::Stop } else { Self::Retain }
    }
}

/// Decides, line by line from newest to oldest, where the retained tail ends.
///
/// `retained` is the number of lines already kept when `line` is examined.
/// Any `Fn(&str, usize) -> Result<Verdict>` closure is a predicate.
pub trait StopPredicate {
    /// Examines one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be evaluated. Errors for which
    /// [`FilterError::is_boundary`] holds end the scan like [`Verdict::Stop`].
    fn check(&self, line: &str, retained: usize) -> Result<Verdict>;

    /// Length in bytes of a leading header that is never examined.
    ///
    /// A scan that reaches the header without stopping retains the file whole.
    fn header_len(&self) -> u64 {
        0
    }
}

impl<F> StopPredicate for F
where
    F: Fn(&str, usize) -> Result<Verdict>,
{
    fn check(&self, line: &str, retained: usize) -> Result<Verdict> {
        self(line, retained)
    }
}

/// Computes `reference - minutes`.
#[must_use]
pub fn deadline_from(reference: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    reference - Duration::minutes(i64::from(minutes))
}

/// Keeps exactly `limit` newest lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCountPredicate {
    limit: usize,
}

impl LineCountPredicate {
    /// Creates a predicate retaining at most `limit` lines.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl StopPredicate for LineCountPredicate {
    fn check(&self, _line: &str, retained: usize) -> Result<Verdict> {
        Ok(Verdict::stop_if(retained >= self.limit))
    }
}

/// Keeps lines whose leading RFC3339 token is not older than a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPredicate {
    deadline: DateTime<Utc>,
}

impl TimestampPredicate {
    /// Creates a predicate with the given deadline.
    #[must_use]
    pub const fn new(deadline: DateTime<Utc>) -> Self {
        Self { deadline }
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }
}

impl StopPredicate for TimestampPredicate {
    fn check(&self, line: &str, _retained: usize) -> Result<Verdict> {
        let token = line.split_whitespace().next().unwrap_or_default();
        let stamp = DateTime::parse_from_rfc3339(token)
            .map_err(|_| FilterError::MalformedTimestamp(token.to_string()))?;
        Ok(Verdict::stop_if(stamp.with_timezone(&Utc) < self.deadline))
    }
}

/// Keeps journal lines whose reconstructed timestamp is not older than a deadline.
///
/// Journal lines carry `Mon DD HH:MM:SS` only. The year and UTC offset are
/// taken from the end date of the dump header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalTimestampPredicate {
    end: DateTime<FixedOffset>,
    deadline: DateTime<Utc>,
    header_len: u64,
}

impl JournalTimestampPredicate {
    /// Creates a predicate anchored on the header end date.
    #[must_use]
    pub const fn new(end: DateTime<FixedOffset>, deadline: DateTime<Utc>) -> Self {
        Self {
            end,
            deadline,
            header_len: 0,
        }
    }

    /// Skips the first `header_len` bytes of the dump, which hold its header.
    #[must_use]
    pub const fn with_header_len(mut self, header_len: u64) -> Self {
        self.header_len = header_len;
        self
    }

    /// Returns the header end date used as anchor.
    #[must_use]
    pub const fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Reconstructs the absolute time of a line.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::JournalTimestamp`] unless the line holds exactly
    /// one partial timestamp naming a valid calendar date.
    pub fn line_time(&self, line: &str) -> Result<DateTime<FixedOffset>> {
        let mut matches = JOURNAL_LINE_TIMESTAMP.find_iter(line);
        let token = match (matches.next(), matches.next()) {
            (Some(token), None) => token.as_str(),
            (None, _) => return Err(FilterError::JournalTimestamp("no token found".into())),
            (Some(_), Some(_)) => {
                return Err(FilterError::JournalTimestamp(format!(
                    "{} tokens found",
                    2 + matches.count()
                )));
            }
        };
        // "Sep  6" pads single digit days with a second space
        let token = token.split_whitespace().collect::<Vec<_>>().join(" ");

        let stamp = match self.anchor(self.end.year(), &token) {
            Ok(stamp) => stamp,
            // Feb 29 next to an end date in a non-leap year
            Err(_) => return self.anchor(self.end.year() - 1, &token),
        };
        // dumps spanning new year carry December lines next to a January end date
        if stamp > self.end + Duration::days(1) {
            return self.anchor(self.end.year() - 1, &token);
        }
        Ok(stamp)
    }

    fn anchor(&self, year: i32, token: &str) -> Result<DateTime<FixedOffset>> {
        let naive = NaiveDateTime::parse_from_str(&format!("{year} {token}"), "%Y %b %d %H:%M:%S")
            .map_err(|e| FilterError::JournalTimestamp(format!("{token:?}: {e}")))?;
        naive
            .and_local_timezone(*self.end.offset())
            .single()
            .ok_or_else(|| FilterError::JournalTimestamp(format!("{token:?}: not representable")))
    }
}

impl StopPredicate for JournalTimestampPredicate {
    fn check(&self, line: &str, _retained: usize) -> Result<Verdict> {
        let stamp = self.line_time(line)?;
        Ok(Verdict::stop_if(stamp.with_timezone(&Utc) < self.deadline))
    }

    fn header_len(&self) -> u64 {
        self.header_len
    }
}
