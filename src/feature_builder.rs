//! Feature vector assembly for model inference.
//!
//! Turns raw form values into numeric vectors laid out exactly the way the
//! scaler and models were fit: one entry per schema column, in schema order,
//! with categorical labels replaced by their encoder codes.

use crate::error::{InsightError, Result};
use crate::models::encoder::EncoderRegistry;
use crate::models::schema::FeatureSchema;
use crate::types::input::{FieldValue, RawInput};
use tracing::debug;

/// Builds encoded feature vectors from raw form input.
pub struct FeatureBuilder<'a> {
    encoders: &'a EncoderRegistry,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(encoders: &'a EncoderRegistry) -> Self {
        Self { encoders }
    }

    /// Encode `input` against the full feature `schema`.
    ///
    /// The result has `schema.len()` entries in schema order. Extra input
    /// columns are ignored.
    pub fn build(&self, schema: &FeatureSchema, input: &RawInput) -> Result<Vec<f64>> {
        let features = self.encode_columns(schema, input)?;

        let extra = extra_columns(schema, input);
        if !extra.is_empty() {
            debug!(columns = ?extra, "Ignoring columns outside the feature schema");
        }

        Ok(features)
    }

    /// Encode `input` against a column subset of the full schema, in the
    /// subset's order.
    pub fn build_subset(&self, subset: &FeatureSchema, input: &RawInput) -> Result<Vec<f64>> {
        self.encode_columns(subset, input)
    }

    fn encode_columns(&self, schema: &FeatureSchema, input: &RawInput) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(schema.len());

        for column in schema.columns() {
            let value = input
                .get(column)
                .ok_or_else(|| InsightError::MissingColumn(column.clone()))?;
            features.push(self.encode_value(column, value)?);
        }

        Ok(features)
    }

    fn encode_value(&self, column: &str, value: &FieldValue) -> Result<f64> {
        if self.encoders.is_categorical(column) {
            let label = value.as_label().ok_or_else(|| InsightError::InvalidValue {
                column: column.to_string(),
                reason: format!("expected a category label, got a {}", value.type_name()),
            })?;
            let code = self
                .encoders
                .encode(column, label)?
                .ok_or_else(|| InsightError::InvalidValue {
                    column: column.to_string(),
                    reason: "no encoder registered".to_string(),
                })?;
            return Ok(code as f64);
        }

        match value.as_number() {
            Some(n) if n.is_finite() => Ok(n),
            Some(_) => Err(InsightError::InvalidValue {
                column: column.to_string(),
                reason: "value is not finite".to_string(),
            }),
            None => Err(InsightError::InvalidValue {
                column: column.to_string(),
                reason: format!("expected a number, got a {}", value.type_name()),
            }),
        }
    }
}

/// Input columns that `schema` does not use.
fn extra_columns<'i>(schema: &FeatureSchema, input: &'i RawInput) -> Vec<&'i str> {
    if input.len() <= schema.len() {
        return Vec::new();
    }
    let mut extra: Vec<&str> = input.columns().filter(|c| !schema.contains(c)).collect();
    extra.sort_unstable();
    extra
}
