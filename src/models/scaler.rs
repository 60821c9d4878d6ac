//! Standard scaler (per-feature centering and scaling)

use crate::error::{InsightError, Result};
use crate::models::schema::FeatureSchema;
use serde::Deserialize;

/// Fitted `(x - mean) / scale` transform over named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    /// Columns the scaler was fit on, in fit order
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler, validating that all parameter vectors agree in width.
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        let width = self.feature_names.len();
        if self.mean.len() != width || self.scale.len() != width {
            return Err(InsightError::artifact(
                "scaler",
                format!(
                    "{} feature names but {} means and {} scales",
                    width,
                    self.mean.len(),
                    self.scale.len()
                ),
            ));
        }
        if let Some(i) = self
            .mean
            .iter()
            .chain(self.scale.iter())
            .position(|v| !v.is_finite())
        {
            return Err(InsightError::artifact(
                "scaler",
                format!("non-finite parameter at position {}", i % width.max(1)),
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Check the scaler was fit on exactly `schema`, same names, same order.
    pub fn check_compatible(&self, schema: &FeatureSchema, artifact: &str) -> Result<()> {
        if self.feature_names.as_slice() != schema.columns() {
            let first_diff = self
                .feature_names
                .iter()
                .zip(schema.columns())
                .position(|(a, b)| a != b);
            let reason = match first_diff {
                Some(i) => format!(
                    "column {} is '{}' in the scaler but '{}' in the schema",
                    i,
                    self.feature_names[i],
                    schema.columns()[i]
                ),
                None => format!(
                    "scaler has {} columns, schema has {}",
                    self.width(),
                    schema.len()
                ),
            };
            return Err(InsightError::artifact(artifact, reason));
        }
        Ok(())
    }

    /// Derive a scaler for a subset of columns by selecting their fitted
    /// parameters by name.
    pub fn select(&self, subset: &FeatureSchema) -> Result<Self> {
        let mut mean = Vec::with_capacity(subset.len());
        let mut scale = Vec::with_capacity(subset.len());

        for column in subset.columns() {
            let i = self
                .feature_names
                .iter()
                .position(|c| c == column)
                .ok_or_else(|| {
                    InsightError::artifact(
                        "scaler",
                        format!("cannot derive attrition scaler: no column '{}'", column),
                    )
                })?;
            mean.push(self.mean[i]);
            scale.push(self.scale[i]);
        }

        Self::new(subset.columns().to_vec(), mean, scale)
    }

    /// Apply the transform. The input must have exactly the fitted width.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.width() {
            return Err(InsightError::mismatch("scaler", self.width(), values.len()));
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // constant features were fit with zero variance
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// On-disk scaler artifact: `{ "feature_names": [...], "mean": [...], "scale": [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct ScalerArtifact {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerArtifact {
    pub fn into_scaler(self) -> Result<StandardScaler> {
        StandardScaler::new(self.feature_names, self.mean, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_transform() {
        let scaler =
            StandardScaler::new(names(&["a", "b"]), vec![10.0, 0.0], vec![2.0, 0.5]).unwrap();
        let out = scaler.transform(&[14.0, 1.0]).unwrap();
        assert_eq!(out, vec![2.0, 2.0]);
    }

    #[test]
    fn test_zero_scale_is_identity_scale() {
        let scaler = StandardScaler::new(names(&["a"]), vec![3.0], vec![0.0]).unwrap();
        assert_eq!(scaler.transform(&[5.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler =
            StandardScaler::new(names(&["a", "b"]), vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            InsightError::SchemaMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_parameter_lengths_validated() {
        assert!(StandardScaler::new(names(&["a", "b"]), vec![0.0], vec![1.0, 1.0]).is_err());
        assert!(StandardScaler::new(names(&["a"]), vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_compatibility_check() {
        let scaler =
            StandardScaler::new(names(&["a", "b"]), vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();

        let same = FeatureSchema::new(names(&["a", "b"])).unwrap();
        assert!(scaler.check_compatible(&same, "scaler").is_ok());

        let swapped = FeatureSchema::new(names(&["b", "a"])).unwrap();
        let err = scaler.check_compatible(&swapped, "scaler").unwrap_err();
        assert!(err.to_string().contains("column 0"));

        let wider = FeatureSchema::new(names(&["a", "b", "c"])).unwrap();
        assert!(scaler.check_compatible(&wider, "scaler").is_err());
    }

    #[test]
    fn test_select_subset() {
        let scaler = StandardScaler::new(
            names(&["a", "b", "c"]),
            vec![1.0, 2.0, 3.0],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();
        let subset = FeatureSchema::new(names(&["c", "a"])).unwrap();

        let derived = scaler.select(&subset).unwrap();
        assert_eq!(derived.feature_names(), &names(&["c", "a"])[..]);
        assert_eq!(derived.transform(&[33.0, 11.0]).unwrap(), vec![1.0, 1.0]);
    }
}
