//! Error types for the insights pipeline.
//!
//! Every failure surfaced by the library is an [`InsightError`]. Each variant
//! belongs to one of four [`ErrorKind`]s so callers can tell a broken artifact
//! set apart from a rejected form or a failing model:
//!
//! - **ArtifactLoad**: a model, encoder, scaler or schema file is missing,
//!   corrupt, or inconsistent with the others
//! - **Encoding**: a submitted value cannot be encoded for its column
//! - **SchemaMismatch**: a vector's width/order disagrees with what a scaler or
//!   model expects, or the form is missing a column
//! - **ModelInvocation**: the underlying predict call failed

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum InsightError {
    // Artifact errors
    #[error("Artifact '{artifact}' could not be loaded: {reason}")]
    ArtifactLoad { artifact: String, reason: String },

    #[error("Model '{model}' declares {declared} targets but produces {actual} outputs")]
    TargetWidth {
        model: String,
        declared: usize,
        actual: usize,
    },

    // Encoding errors
    #[error("Unknown category '{label}' for column '{column}' (known: {known:?})")]
    UnknownCategory {
        column: String,
        label: String,
        known: Vec<String>,
    },

    #[error("Invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    // Schema errors
    #[error("Missing value for column '{0}'")]
    MissingColumn(String),

    #[error("Schema mismatch in {context}: expected {expected}, got {actual}")]
    SchemaMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    // Model errors
    #[error("Model '{model}' failed: {reason}")]
    ModelInvocation { model: String, reason: String },
}

/// Coarse classification of an [`InsightError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ArtifactLoad,
    Encoding,
    SchemaMismatch,
    ModelInvocation,
}

impl InsightError {
    /// Shorthand for an artifact load failure.
    pub fn artifact(artifact: impl Into<String>, reason: impl ToString) -> Self {
        InsightError::ArtifactLoad {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a failed model call.
    pub fn model(model: impl Into<String>, reason: impl ToString) -> Self {
        InsightError::ModelInvocation {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a width check failure.
    pub fn mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        InsightError::SchemaMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// The kind of failure this error represents.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InsightError::ArtifactLoad { .. } | InsightError::TargetWidth { .. } => {
                ErrorKind::ArtifactLoad
            }
            InsightError::UnknownCategory { .. } | InsightError::InvalidValue { .. } => {
                ErrorKind::Encoding
            }
            InsightError::MissingColumn(_) | InsightError::SchemaMismatch { .. } => {
                ErrorKind::SchemaMismatch
            }
            InsightError::ModelInvocation { .. } => ErrorKind::ModelInvocation,
        }
    }

    /// Whether the error was caused by the submitted form rather than the
    /// artifacts or models.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            InsightError::UnknownCategory { .. }
                | InsightError::InvalidValue { .. }
                | InsightError::MissingColumn(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            InsightError::artifact("scaler", "missing").kind(),
            ErrorKind::ArtifactLoad
        );
        assert_eq!(
            InsightError::TargetWidth {
                model: "classifier".into(),
                declared: 3,
                actual: 4
            }
            .kind(),
            ErrorKind::ArtifactLoad
        );
        assert_eq!(
            InsightError::UnknownCategory {
                column: "Gender".into(),
                label: "x".into(),
                known: vec![]
            }
            .kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            InsightError::MissingColumn("Age".into()).kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            InsightError::model("regressor", "boom").kind(),
            ErrorKind::ModelInvocation
        );
    }

    #[test]
    fn test_rejected_input() {
        assert!(InsightError::MissingColumn("Age".into()).is_rejected_input());
        assert!(!InsightError::mismatch("scaler", 3, 2).is_rejected_input());
    }

    #[test]
    fn test_error_display() {
        let err = InsightError::mismatch("scaler", 20, 6);
        assert_eq!(
            err.to_string(),
            "Schema mismatch in scaler: expected 20, got 6"
        );
    }
}
