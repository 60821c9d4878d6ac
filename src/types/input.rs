//! Assessment form data structures

use crate::error::ErrorKind;
use crate::types::report::InsightFailure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request id reported for payloads that carry none
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// A single submitted form value.
///
/// Categorical columns expect a label from the encoder's class list, numeric
/// columns expect a number. Range hints shown on the form are not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Label(String),
    /// Any other JSON value (bool, null, list, object); never encodable
    Other(serde_json::Value),
}

impl FieldValue {
    /// Numeric view of the value. Labels that parse as numbers are accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Label(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Other(_) => None,
        }
    }

    /// Label view of the value, if it is a string.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            FieldValue::Label(s) => Some(s.as_str()),
            FieldValue::Number(_) | FieldValue::Other(_) => None,
        }
    }

    /// JSON type of the submitted value, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "number",
            FieldValue::Label(_) => "string",
            FieldValue::Other(serde_json::Value::Null) => "null",
            FieldValue::Other(serde_json::Value::Bool(_)) => "boolean",
            FieldValue::Other(serde_json::Value::Array(_)) => "array",
            FieldValue::Other(_) => "object",
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Label(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Label(value)
    }
}

/// Raw form values keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    values: HashMap<String, FieldValue>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(column.into(), value.into());
    }

    /// Builder-style variant of [`RawInput::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FieldValue)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// An assessment request as received from the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// Caller-supplied identifier; generated when absent
    #[serde(default = "new_request_id")]
    pub request_id: String,

    /// Completed form values
    pub values: RawInput,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl AssessmentRequest {
    pub fn new(values: RawInput) -> Self {
        Self {
            request_id: new_request_id(),
            values,
        }
    }

    /// Decode a transport payload.
    ///
    /// A payload that is not a valid request becomes an `Encoding` failure,
    /// addressed to the sender's `request_id` when one can be read.
    pub fn from_payload(payload: &[u8]) -> Result<Self, InsightFailure> {
        serde_json::from_slice(payload).map_err(|e| {
            let request_id = serde_json::from_slice::<serde_json::Value>(payload)
                .ok()
                .and_then(|v| v.get("request_id")?.as_str().map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_REQUEST_ID.to_string());
            InsightFailure::new(
                request_id,
                ErrorKind::Encoding,
                format!("Malformed assessment request: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged() {
        let input: RawInput =
            serde_json::from_str(r#"{"Gender": "Female", "Age": 34, "SleepHours": "6.5"}"#)
                .unwrap();

        assert_eq!(input.get("Gender").and_then(|v| v.as_label()), Some("Female"));
        assert_eq!(input.get("Age").and_then(|v| v.as_number()), Some(34.0));
        assert_eq!(input.get("SleepHours").and_then(|v| v.as_number()), Some(6.5));
        assert_eq!(input.get("Gender").and_then(|v| v.as_number()), None);
    }

    #[test]
    fn test_untyped_values_still_decode() {
        let req: AssessmentRequest = serde_json::from_str(
            r#"{"request_id": "emp-1", "values": {"Age": null, "HasTherapyAccess": true}}"#,
        )
        .unwrap();

        let therapy = req.values.get("HasTherapyAccess").unwrap();
        assert_eq!(therapy, &FieldValue::Other(serde_json::Value::Bool(true)));
        assert_eq!(therapy.type_name(), "boolean");
        assert_eq!(therapy.as_label(), None);
        assert_eq!(therapy.as_number(), None);
        assert_eq!(req.values.get("Age").unwrap().type_name(), "null");
    }

    #[test]
    fn test_request_id_defaults() {
        let req: AssessmentRequest = serde_json::from_str(r#"{"values": {"Age": 30}}"#).unwrap();
        assert!(!req.request_id.is_empty());
        assert_eq!(req.values.len(), 1);

        let req: AssessmentRequest =
            serde_json::from_str(r#"{"request_id": "emp-7", "values": {}}"#).unwrap();
        assert_eq!(req.request_id, "emp-7");
        assert!(req.values.is_empty());
    }

    #[test]
    fn test_malformed_payload_becomes_failure() {
        let failure =
            AssessmentRequest::from_payload(br#"{"request_id": "emp-9", "values": [1, 2]}"#)
                .unwrap_err();
        assert_eq!(failure.request_id, "emp-9");
        assert_eq!(failure.kind, ErrorKind::Encoding);
        assert!(failure.message.starts_with("Malformed assessment request"));

        let failure = AssessmentRequest::from_payload(b"not json").unwrap_err();
        assert_eq!(failure.request_id, UNKNOWN_REQUEST_ID);

        let req = AssessmentRequest::from_payload(br#"{"request_id": "emp-3", "values": {}}"#)
            .unwrap();
        assert_eq!(req.request_id, "emp-3");
    }
}
