//! Categorical label encoders

use crate::error::{InsightError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Maps a fixed, ordered set of string classes to integer codes.
///
/// The code of a class is its position in the class list, so encoding and
/// decoding are inverses for every known class.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build an encoder, rejecting empty or duplicated class lists.
    pub fn new(column: &str, classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(InsightError::artifact(
                "label_encoders",
                format!("encoder for '{}' has no classes", column),
            ));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(InsightError::artifact(
                    "label_encoders",
                    format!("encoder for '{}' lists '{}' twice", column, class),
                ));
            }
        }

        Ok(Self { classes, codes })
    }

    /// Known classes, in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code for a label, if known
    pub fn code(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Label for a code, if in range
    pub fn label(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Encoders keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderRegistry {
    encoders: HashMap<String, LabelEncoder>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `column -> classes`, as stored in the encoder
    /// artifact.
    pub fn from_classes(classes: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut registry = Self::new();
        for (column, classes) in classes {
            let encoder = LabelEncoder::new(&column, classes)?;
            registry.encoders.insert(column, encoder);
        }
        Ok(registry)
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn is_categorical(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    /// Encode a label for a column, rejecting unknown classes.
    ///
    /// Returns `Ok(None)` when the column is not categorical.
    pub fn encode(&self, column: &str, label: &str) -> Result<Option<usize>> {
        let Some(encoder) = self.encoders.get(column) else {
            return Ok(None);
        };
        encoder
            .code(label)
            .map(Some)
            .ok_or_else(|| InsightError::UnknownCategory {
                column: column.to_string(),
                label: label.to_string(),
                known: encoder.classes().to_vec(),
            })
    }

    /// Decode a code back to its label
    pub fn decode(&self, column: &str, code: usize) -> Option<&str> {
        self.encoders.get(column).and_then(|e| e.label(code))
    }
}

/// On-disk encoder artifact: `{ "<column>": ["class0", "class1", ...] }`
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(crate) struct EncoderArtifact(pub BTreeMap<String, Vec<String>>);

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EncoderRegistry {
        let mut classes = BTreeMap::new();
        classes.insert(
            "Gender".to_string(),
            vec!["Female".into(), "Male".into(), "Non-binary".into()],
        );
        classes.insert(
            "RemoteWork".to_string(),
            vec!["Hybrid".into(), "No".into(), "Yes".into()],
        );
        EncoderRegistry::from_classes(classes).unwrap()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let registry = registry();
        for column in ["Gender", "RemoteWork"] {
            let encoder = registry.get(column).unwrap();
            for class in encoder.classes() {
                let code = registry.encode(column, class).unwrap().unwrap();
                assert_eq!(registry.decode(column, code), Some(class.as_str()));
            }
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let registry = registry();
        let err = registry.encode("Gender", "Unknown").unwrap_err();
        match err {
            InsightError::UnknownCategory { column, label, known } => {
                assert_eq!(column, "Gender");
                assert_eq!(label, "Unknown");
                assert_eq!(known.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_categorical_column() {
        let registry = registry();
        assert_eq!(registry.encode("Age", "34").unwrap(), None);
        assert!(!registry.is_categorical("Age"));
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        assert!(LabelEncoder::new("Gender", vec!["A".into(), "A".into()]).is_err());
        assert!(LabelEncoder::new("Gender", vec![]).is_err());
    }

    #[test]
    fn test_artifact_format() {
        let artifact: EncoderArtifact =
            serde_json::from_str(r#"{"Department": ["Finance", "HR", "IT"]}"#).unwrap();
        let registry = EncoderRegistry::from_classes(artifact.0).unwrap();
        assert_eq!(registry.encode("Department", "IT").unwrap(), Some(2));
    }
}
