use std::fmt;

use serde::Serialize;

/// A single problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIssue {
    /// Dotted path to the offending manifest node (e.g. `messages[2].fields[0].type`).
    pub path: String,
    pub message: String,
}

impl ManifestIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate of every issue found by [`Manifest::validate`](crate::Manifest::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ManifestIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ManifestIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ManifestIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ManifestIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest has {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failure to load or resolve a manifest into a [`Schema`](crate::Schema).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to parse manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{path}: {message}")]
    Resolve { path: String, message: String },
}
