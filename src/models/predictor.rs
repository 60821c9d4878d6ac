//! Model abstraction and named output targets

use crate::error::{InsightError, Result};
use std::collections::HashSet;

/// A loaded model that maps one input row to one output row.
///
/// Implementations must be deterministic and must not mutate observable
/// state; the engine shares them across concurrent requests.
pub trait Predictor: Send + Sync {
    /// Model name used in logs and errors
    fn name(&self) -> &str;

    /// Run the model on a single row.
    fn predict(&self, row: &[f64]) -> Result<Vec<f64>>;
}

/// Named targets of a multi-output model, in the model's output order.
///
/// The mapping is checked against the model's real output width at load
/// time, so position `i` of a prediction always belongs to `names()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMap {
    model: String,
    names: Vec<String>,
}

impl TargetMap {
    pub fn new(model: impl Into<String>, names: Vec<String>) -> Result<Self> {
        let model = model.into();
        if names.is_empty() {
            return Err(InsightError::artifact(
                model,
                "no output targets declared",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(InsightError::artifact(
                model,
                format!("target '{}' declared twice", dup),
            ));
        }
        Ok(Self { model, names })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, target: &str) -> Option<usize> {
        self.names.iter().position(|n| n == target)
    }

    /// Fail unless a model output of `actual` values lines up with the
    /// declared targets.
    pub fn check_width(&self, actual: usize) -> Result<()> {
        if actual != self.names.len() {
            return Err(InsightError::TargetWidth {
                model: self.model.clone(),
                declared: self.names.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Pair each target with its output value.
    pub fn label<'a, T: Copy>(
        &'a self,
        outputs: &'a [T],
    ) -> Result<impl Iterator<Item = (&'a str, T)> + 'a> {
        if outputs.len() != self.names.len() {
            return Err(InsightError::mismatch(
                format!("{} output", self.model),
                self.names.len(),
                outputs.len(),
            ));
        }
        Ok(self
            .names
            .iter()
            .map(String::as_str)
            .zip(outputs.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> TargetMap {
        TargetMap::new(
            "classifier",
            vec![
                "BurnoutRisk".into(),
                "NeedsSupport".into(),
                "HighStressFlag".into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_check_width() {
        let map = targets();
        assert!(map.check_width(3).is_ok());

        let err = map.check_width(4).unwrap_err();
        assert!(matches!(
            err,
            InsightError::TargetWidth {
                declared: 3,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_label_pairs_by_position() {
        let map = targets();
        let pairs: Vec<_> = map.label(&[true, false, true]).unwrap().collect();
        assert_eq!(
            pairs,
            vec![
                ("BurnoutRisk", true),
                ("NeedsSupport", false),
                ("HighStressFlag", true)
            ]
        );
        assert!(map.label(&[true]).is_err());
        assert_eq!(map.index_of("HighStressFlag"), Some(2));
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let err = TargetMap::new("regressor", vec!["A".into(), "A".into()]).unwrap_err();
        assert!(err.to_string().contains("'A' declared twice"));
        assert!(TargetMap::new("regressor", vec![]).is_err());
    }
}
