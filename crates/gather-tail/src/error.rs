//! Error types for tail filtering.

use thiserror::Error;

/// Errors that can occur while building predicates or filtering a file.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The caller supplied an unusable argument, such as an empty path.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred while reading or rewriting a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The leading token of a line is not an RFC3339 timestamp.
    ///
    /// The scanner treats this as the end of the usable tail rather than a
    /// failure, see [`FilterError::is_boundary`].
    #[error("malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    /// A journal line does not carry exactly one partial timestamp.
    #[error("ambiguous or missing timestamp token: {0}")]
    JournalTimestamp(String),

    /// The journal header is shorter than two lines.
    #[error("journal header missing: {0}")]
    HeaderMissing(String),

    /// The journal header dates could not be extracted or parsed.
    #[error("unable to parse journal header dates: {0}")]
    HeaderParse(String),
}

impl FilterError {
    /// Returns true if the error marks the point where scanning stops
    /// instead of aborting the whole filtering operation.
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        matches!(self, Self::MalformedTimestamp(_))
    }
}

/// Result type alias for tail filtering operations.
pub type Result<T> = std::result::Result<T, FilterError>;
