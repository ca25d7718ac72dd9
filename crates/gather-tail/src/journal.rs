//! Journal dump header resolution.
//!
//! Journal dumps open with a two line header whose second line names the
//! covered interval, for example:
//!
//! ```text
//! -- Logs begin at Thu 2019-09-26 10:00:00 UTC, end at Thu 2019-09-26 14:00:00 UTC. --
//! ```
//!
//! The end date anchors the year and offset of the partial timestamps found
//! on every following line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{FilterError, Result};
use crate::predicate::JournalTimestampPredicate;

/// Full header date, e.g. `Thu 2019-09-26 14:00:00 UTC`.
static HEADER_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z]{3}\s(\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2})\s([A-Za-z]{3,5})\b")
        .unwrap_or_else(|_| unreachable!())
});

/// Zone abbreviations and their offsets east of UTC in seconds.
const ZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("WET", 0),
    ("WEST", 3600),
    ("BST", 3600),
    ("CET", 3600),
    ("CEST", 2 * 3600),
    ("EET", 2 * 3600),
    ("EEST", 3 * 3600),
    ("IST", 5 * 3600 + 1800),
    ("SGT", 8 * 3600),
    ("HKT", 8 * 3600),
    ("AWST", 8 * 3600),
    ("JST", 9 * 3600),
    ("KST", 9 * 3600),
    ("AEST", 10 * 3600),
    ("AEDT", 11 * 3600),
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
];

/// Resolves a zone abbreviation to a fixed offset.
///
/// Unknown abbreviations resolve to UTC.
#[must_use]
pub fn zone_offset(abbreviation: &str) -> FixedOffset {
    let seconds = ZONES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(abbreviation))
        .map_or_else(
            || {
                warn!(zone = abbreviation, "unknown zone abbreviation, assuming UTC");
                0
            },
            |(_, seconds)| *seconds,
        );
    FixedOffset::east_opt(seconds).unwrap_or_else(|| unreachable!())
}

/// Extracts the end date from the interval line of a journal header.
///
/// # Errors
///
/// Returns [`FilterError::HeaderParse`] unless exactly two dates are present
/// and the second one parses.
pub fn parse_header_line(line: &str) -> Result<DateTime<FixedOffset>> {
    let dates: Vec<_> = HEADER_DATE.captures_iter(line).collect();
    let [_, end] = dates.as_slice() else {
        return Err(FilterError::HeaderParse(format!(
            "expected start and end dates, found {} in {line:?}",
            dates.len()
        )));
    };

    let naive = NaiveDateTime::parse_from_str(&end[1], "%Y-%m-%d %H:%M:%S")
        .map_err(|e| FilterError::HeaderParse(format!("end date {:?}: {e}", &end[1])))?;
    naive
        .and_local_timezone(zone_offset(&end[2]))
        .single()
        .ok_or_else(|| FilterError::HeaderParse(format!("end date {:?} not representable", &end[1])))
}

/// Reads the header of a journal dump and builds the matching predicate.
///
/// The predicate skips the two header lines, so a dump whose every entry is
/// recent is retained whole.
///
/// Returns `Ok(None)` when the dump ended before `deadline`: no line in it
/// can qualify, and the caller decides whether to keep or empty the file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has fewer than two lines, or
/// its second line does not carry both header dates.
pub fn resolve_journal_predicate(
    path: impl AsRef<Path>,
    deadline: DateTime<Utc>,
) -> Result<Option<JournalTimestampPredicate>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let mut line = Vec::new();
    let mut header_len = 0;
    for index in 0..2 {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        header_len += read as u64;
        if read == 0 {
            return Err(FilterError::HeaderMissing(format!(
                "{} ends before header line {}",
                path.display(),
                index + 1
            )));
        }
    }

    let end = parse_header_line(&String::from_utf8_lossy(&line))?;
    if end.with_timezone(&Utc) < deadline {
        debug!(path = %path.display(), %end, %deadline, "journal dump ends before deadline");
        return Ok(None);
    }
    Ok(Some(JournalTimestampPredicate::new(end, deadline).with_header_len(header_len)))
}
