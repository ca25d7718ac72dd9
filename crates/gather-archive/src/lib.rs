//! # gather-archive
//!
//! Builds gzip-compressed tar archives of must-gather trees, bounding log
//! files to their most recent content on the way in.
//!
//! This crate provides:
//!
//! - [`FilterConfig`]: Line limit or time window, plus the reference time
//! - [`ClassificationRules`]: Ordered path rules deciding each file's [`LogKind`]
//! - [`Archiver`]: Walks the tree, filters, and writes the archive
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use gather_archive::{Archiver, ClassificationRules, FilterConfig, FilterMode};
//!
//! let config = FilterConfig::new(FilterMode::Since(30), Utc::now());
//! let rules = ClassificationRules::default().with_exemptions(["audit"]);
//! let summary = Archiver::new(config, rules).archive("must-gather", "must-gather.tar.gz")?;
//! println!("{} files, {} filtered", summary.files, summary.filtered);
//! # Ok::<(), gather_archive::ArchiveError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archiver;
pub mod classify;
pub mod config;
pub mod error;

// Re-export main types
pub use archiver::{select_predicate, ArchiveSummary, Archiver};
pub use classify::{ClassificationRules, LogKind, PathMatcher, Rule};
pub use config::{FilterConfig, FilterMode, StaleJournalPolicy};
pub use error::{ArchiveError, Result};
