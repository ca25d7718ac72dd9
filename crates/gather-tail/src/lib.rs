//! # gather-tail
//!
//! Bounded tail filtering for must-gather log files.
//!
//! This crate provides:
//!
//! - [`StopPredicate`]: Decides per line where the retained tail ends
//! - [`LineCountPredicate`]: Keeps the newest `N` lines
//! - [`TimestampPredicate`]: Keeps RFC3339-stamped lines newer than a deadline
//! - [`JournalTimestampPredicate`]: Same, for journal dumps with partial timestamps
//! - [`resolve_journal_predicate`]: Builds the journal predicate from a dump header
//! - [`tail_file`]: Backward scan that truncates a file to its retained tail
//!
//! ## Example
//!
//! ```rust,no_run
//! use gather_tail::{tail_file, LineCountPredicate};
//!
//! // Keep the last 500 lines of a container log
//! let report = tail_file("/must-gather/pods/api.log", &LineCountPredicate::new(500))?;
//! println!("kept {} lines", report.retained);
//! # Ok::<(), gather_tail::FilterError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod journal;
pub mod predicate;
pub mod scanner;

// Re-export main types
pub use error::{FilterError, Result};
pub use journal::{parse_header_line, resolve_journal_predicate, zone_offset};
pub use predicate::{
    deadline_from, JournalTimestampPredicate, LineCountPredicate, StopPredicate,
    TimestampPredicate, Verdict,
};
pub use scanner::{tail_file, tail_file_with, ScanOptions, StopReason, TailReport, DEFAULT_BLOCK_SIZE};
