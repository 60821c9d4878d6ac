//! Ordered feature column layout

use crate::error::{InsightError, Result};
use std::collections::HashSet;

/// Ordered list of column names a scaler/model was fit on.
///
/// Vector positions follow this order exactly; the schema is immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty or duplicated column lists.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(InsightError::artifact(
                "feature_columns",
                "column list is empty",
            ));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(InsightError::artifact(
                    "feature_columns",
                    format!("duplicate column '{}'", column),
                ));
            }
        }

        Ok(Self { columns })
    }

    /// Build a subset schema whose columns must all appear in `self`.
    ///
    /// The subset keeps its own declared order.
    pub fn subset(&self, columns: Vec<String>) -> Result<Self> {
        if let Some(unknown) = columns.iter().find(|c| !self.contains(c)) {
            return Err(InsightError::artifact(
                "attrition_features",
                format!("column '{}' is not part of the feature schema", unknown),
            ));
        }
        Self::new(columns).map_err(|e| match e {
            InsightError::ArtifactLoad { reason, .. } => {
                InsightError::artifact("attrition_features", reason)
            }
            other => other,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Position of a column in the schema.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}
