//! Validation results, rule descriptors, and the validator contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Severity of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational note.
    Info,
    /// Suspicious but not blocking.
    Warning,
    /// Blocks the operation.
    Error,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Stable machine-readable code (e.g. `UNBALANCED`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Path of the offending field, when one can be named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Additional context (totals, offending values).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl ValidationResult {
    /// Creates an error-severity result.
    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_severity(code, message, Severity::Error)
    }

    /// Creates a warning-severity result.
    #[must_use]
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_severity(code, message, Severity::Warning)
    }

    /// Creates an info-severity result.
    #[must_use]
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_severity(code, message, Severity::Info)
    }

    fn with_severity(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            field: None,
            metadata: HashMap::new(),
        }
    }

    /// Attaches the offending field path.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns true for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Describes one rule a validator checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDescriptor {
    /// Stable rule identifier.
    pub id: String,
    /// What the rule enforces.
    pub description: String,
    /// Severity the rule reports at.
    pub severity: Severity,
    /// Rule grouping (e.g. `structure`, `amounts`).
    pub category: String,
}

/// A pluggable validation rule set.
pub trait Validator<T>: Send + Sync {
    /// Checks the subject and returns all findings.
    fn validate(&self, subject: &T) -> Vec<ValidationResult>;

    /// Returns the rules this validator checks.
    fn rules(&self) -> Vec<RuleDescriptor>;

    /// Execution order: lower priorities run first.
    fn priority(&self) -> i32 {
        0
    }
}

/// Aggregate failure carrying every finding from a validation pass.
///
/// Raised when at least one finding has `Severity::Error`; warnings and
/// infos ride along so the caller can fix everything in one pass.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("validation failed: {}", self.summary())]
pub struct ValidationFailed {
    /// All findings, in validator priority order.
    pub results: Vec<ValidationResult>,
}

impl ValidationFailed {
    /// Creates the aggregate from accumulated findings.
    #[must_use]
    pub fn new(results: Vec<ValidationResult>) -> Self {
        Self { results }
    }

    /// Returns only the error-severity findings.
    #[must_use]
    pub fn errors(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.is_error()).collect()
    }

    /// Returns only the warning-severity findings.
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .collect()
    }

    fn summary(&self) -> String {
        let errors = self.errors();
        match errors.first() {
            None => "no findings".to_string(),
            Some(first) if errors.len() == 1 => first.message.clone(),
            Some(first) => format!("{} (+{} more)", first.message, errors.len() - 1),
        }
    }
}
