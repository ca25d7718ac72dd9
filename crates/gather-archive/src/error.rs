//! Error types for the archiver.

use thiserror::Error;

/// Errors that abort an archive run.
///
/// Filtering failures of individual files are not represented here: the
/// archiver logs them and stores the file unfiltered.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred while reading the tree or writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking the source tree failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A classification rule file could not be parsed.
    #[error("invalid rules: {0}")]
    Rules(#[from] serde_json::Error),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ArchiveError::Config("not possible to filter by time and number of lines".into());
        assert_eq!(
            err.to_string(),
            "configuration error: not possible to filter by time and number of lines"
        );
    }

    #[test]
    fn error_rules_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json");
        let err: ArchiveError = json_err.into();
        assert!(err.to_string().starts_with("invalid rules:"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArchiveError>();
    }
}
