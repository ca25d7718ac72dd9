//! Path classification rules.
//!
//! Rules map a path, relative to the source root, to the kind of log it
//! holds. They are evaluated in order and the first match wins, so
//! exemptions are placed ahead of the generic rules.
//!
//! Rule sets can be loaded from JSON:
//!
//! ```json
//! {
//!   "rules": [
//!     { "match": { "contains": "audit" }, "kind": "exempt" },
//!     { "match": { "regex": "journal/.*\\.txt$" }, "kind": "journal" },
//!     { "match": { "extension": "log" }, "kind": "plain" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Format family of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Journal dump with a header and partial per-line timestamps.
    Journal,
    /// Plain text lines led by an RFC3339 timestamp.
    Plain,
    /// Recognised but never filtered.
    Exempt,
}

/// Test applied to a relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMatcher {
    /// The path contains the substring.
    Contains(String),
    /// The file extension equals the value, with or without a leading dot.
    Extension(String),
    /// The path matches the regular expression.
    Regex(#[serde(with = "serde_regex")] Regex),
}

impl PathMatcher {
    /// Returns true if `relative` satisfies the matcher.
    #[must_use]
    pub fn matches(&self, relative: &Path) -> bool {
        match self {
            Self::Contains(needle) => relative.to_string_lossy().contains(needle.as_str()),
            Self::Extension(ext) => relative
                .extension()
                .is_some_and(|actual| actual == ext.trim_start_matches('.')),
            Self::Regex(re) => re.is_match(&relative.to_string_lossy()),
        }
    }
}

/// One classification rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Path test.
    #[serde(rename = "match")]
    pub matcher: PathMatcher,
    /// Kind assigned on match.
    pub kind: LogKind,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(matcher: PathMatcher, kind: LogKind) -> Self {
        Self { matcher, kind }
    }
}

/// Ordered rule set; the first matching rule decides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRules {
    /// Rules in evaluation order.
    pub rules: Vec<Rule>,
}

impl Default for ClassificationRules {
    /// Journal dumps of kubelet and NetworkManager, and `.log` files.
    fn default() -> Self {
        Self::new(vec![
            Rule::new(PathMatcher::Contains("kubelet".into()), LogKind::Journal),
            Rule::new(PathMatcher::Contains("NetworkManager".into()), LogKind::Journal),
            Rule::new(PathMatcher::Extension("log".into()), LogKind::Plain),
        ])
    }
}

impl ClassificationRules {
    /// Creates a rule set from rules in evaluation order.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses a JSON rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the document or one of its patterns is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON rule set from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Puts exemptions for paths containing any of `substrings` ahead of
    /// every existing rule.
    #[must_use]
    pub fn with_exemptions<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exemptions = substrings
            .into_iter()
            .map(|s| Rule::new(PathMatcher::Contains(s.into()), LogKind::Exempt));
        self.rules.splice(0..0, exemptions);
        self
    }

    /// Returns the kind of the first rule matching `relative`.
    #[must_use]
    pub fn classify(&self, relative: &Path) -> Option<LogKind> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(relative))
            .map(|rule| rule.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("nodes/node-1/kubelet", Some(LogKind::Journal) ; "kubelet journal")]
    #[test_case("nodes/node-1/NetworkManager", Some(LogKind::Journal) ; "network manager journal")]
    #[test_case("namespaces/app/pods/api/api.log", Some(LogKind::Plain) ; "plain log")]
    #[test_case("nodes/node-1/kubelet.log", Some(LogKind::Journal) ; "journal wins by order")]
    #[test_case("cluster-scoped-resources/nodes.yaml", None ; "unclassified")]
    #[test_case("logfile", None ; "no extension")]
    fn default_rules(path: &str, expected: Option<LogKind>) {
        assert_eq!(ClassificationRules::default().classify(Path::new(path)), expected);
    }

    #[test]
    fn exemptions_take_precedence() {
        let rules = ClassificationRules::default().with_exemptions(["audit", "kubelet"]);

        assert_eq!(rules.classify(Path::new("audit_logs/audit.log")), Some(LogKind::Exempt));
        assert_eq!(rules.classify(Path::new("nodes/kubelet")), Some(LogKind::Exempt));
        assert_eq!(rules.classify(Path::new("pods/api.log")), Some(LogKind::Plain));
        assert_eq!(rules.rules.len(), 5);
    }

    #[test]
    fn extension_ignores_leading_dot() {
        let matcher = PathMatcher::Extension(".txt".into());
        assert!(matcher.matches(Path::new("a/b.txt")));
        assert!(!matcher.matches(Path::new("a/b.txt.gz")));
    }

    #[test]
    fn rules_from_json() {
        let rules = ClassificationRules::from_json(
            r#"{
                "rules": [
                    { "match": { "contains": "audit" }, "kind": "exempt" },
                    { "match": { "regex": "journal/.*\\.txt$" }, "kind": "journal" },
                    { "match": { "extension": "log" }, "kind": "plain" }
                ]
            }"#,
        )
        .expect("valid rules");

        assert_eq!(rules.classify(Path::new("host/journal/boot.txt")), Some(LogKind::Journal));
        assert_eq!(rules.classify(Path::new("audit/x.log")), Some(LogKind::Exempt));
        assert_eq!(rules.classify(Path::new("pods/x.log")), Some(LogKind::Plain));
    }

    #[test]
    fn rules_from_json_rejects_bad_pattern() {
        let result = ClassificationRules::from_json(
            r#"{ "rules": [ { "match": { "regex": "(" }, "kind": "plain" } ] }"#,
        );
        assert!(matches!(result, Err(crate::error::ArchiveError::Rules(_))));
    }

    #[test]
    fn rules_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        let json = serde_json::to_string(&ClassificationRules::default()).expect("serialize");
        fs::write(&path, json).expect("write rules");

        let rules = ClassificationRules::load(&path).expect("load");
        assert_eq!(rules.classify(Path::new("x/kubelet")), Some(LogKind::Journal));
    }
}
