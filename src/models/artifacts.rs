//! Validated, immutable set of loaded artifacts

use crate::error::{InsightError, Result};
use crate::models::encoder::EncoderRegistry;
use crate::models::predictor::{Predictor, TargetMap};
use crate::models::scaler::StandardScaler;
use crate::models::schema::FeatureSchema;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Target name reported for the single attrition output
pub const ATTRITION_TARGET: &str = "Attrition";

/// A model paired with the names of its outputs
pub struct TargetedModel {
    pub predictor: Box<dyn Predictor>,
    pub targets: TargetMap,
}

/// The attrition model and the column layout it consumes
pub struct AttritionModel {
    pub predictor: Box<dyn Predictor>,
    /// Columns fed to the model, in the model's order
    pub schema: FeatureSchema,
    /// Scaler fit (or derived) for exactly `schema`
    pub scaler: StandardScaler,
    pub target: TargetMap,
}

/// Unvalidated pieces of an artifact set.
pub struct ArtifactParts {
    pub schema: FeatureSchema,
    pub encoders: EncoderRegistry,
    pub scaler: StandardScaler,
    pub classifier: Box<dyn Predictor>,
    pub classification_targets: Vec<String>,
    pub regressor: Box<dyn Predictor>,
    pub regression_targets: Vec<String>,
    pub attrition: Option<AttritionParts>,
}

/// Unvalidated attrition pieces.
pub struct AttritionParts {
    pub predictor: Box<dyn Predictor>,
    /// Attrition columns; the full schema is used when `None`
    pub columns: Option<Vec<String>>,
    /// Dedicated attrition scaler; derived from the full scaler when `None`
    pub scaler: Option<StandardScaler>,
}

/// Everything one inference request needs, checked for mutual consistency.
pub struct ArtifactSet {
    pub schema: FeatureSchema,
    pub encoders: EncoderRegistry,
    pub scaler: StandardScaler,
    pub classifier: TargetedModel,
    pub regressor: TargetedModel,
    pub attrition: Option<AttritionModel>,
    pub loaded_at: DateTime<Utc>,
}

impl ArtifactSet {
    /// Validate `parts` and assemble them into an artifact set.
    ///
    /// Fails when the scaler does not match the schema, when the attrition
    /// columns are not a subset of the schema, or when a model's real output
    /// width disagrees with its declared targets.
    pub fn assemble(parts: ArtifactParts) -> Result<Self> {
        let ArtifactParts {
            schema,
            encoders,
            scaler,
            classifier,
            classification_targets,
            regressor,
            regression_targets,
            attrition,
        } = parts;

        let unused: Vec<&str> = encoders.columns().filter(|c| !schema.contains(c)).collect();
        if !unused.is_empty() {
            warn!(columns = ?unused, "Encoders registered for columns outside the feature schema");
        }

        scaler.check_compatible(&schema, "scaler")?;

        let classifier = TargetedModel {
            targets: TargetMap::new(classifier.name().to_string(), classification_targets)?,
            predictor: classifier,
        };
        probe(classifier.predictor.as_ref(), &classifier.targets, schema.len())?;

        let regressor = TargetedModel {
            targets: TargetMap::new(regressor.name().to_string(), regression_targets)?,
            predictor: regressor,
        };
        probe(regressor.predictor.as_ref(), &regressor.targets, schema.len())?;

        let attrition = match attrition {
            Some(parts) => Some(assemble_attrition(parts, &schema, &scaler)?),
            None => None,
        };

        info!(
            features = schema.len(),
            encoders = encoders.len(),
            classification_targets = classifier.targets.len(),
            regression_targets = regressor.targets.len(),
            attrition_features = attrition.as_ref().map(|a| a.schema.len()),
            "Artifact set validated"
        );

        Ok(Self {
            schema,
            encoders,
            scaler,
            classifier,
            regressor,
            attrition,
            loaded_at: Utc::now(),
        })
    }

    /// Names of the loaded models
    pub fn model_names(&self) -> Vec<String> {
        let mut names = vec![
            self.classifier.predictor.name().to_string(),
            self.regressor.predictor.name().to_string(),
        ];
        if let Some(attrition) = &self.attrition {
            names.push(attrition.predictor.name().to_string());
        }
        names
    }
}

fn assemble_attrition(
    parts: AttritionParts,
    schema: &FeatureSchema,
    full_scaler: &StandardScaler,
) -> Result<AttritionModel> {
    let subset = match parts.columns {
        Some(columns) => schema.subset(columns)?,
        None => schema.clone(),
    };

    let scaler = match parts.scaler {
        Some(scaler) => {
            scaler.check_compatible(&subset, "attrition_scaler")?;
            scaler
        }
        None => full_scaler.select(&subset)?,
    };

    let target = TargetMap::new(
        parts.predictor.name().to_string(),
        vec![ATTRITION_TARGET.to_string()],
    )?;
    probe(parts.predictor.as_ref(), &target, subset.len())?;

    Ok(AttritionModel {
        predictor: parts.predictor,
        schema: subset,
        scaler,
        target,
    })
}

/// Run a model once on a zero row and check its output width.
fn probe(predictor: &dyn Predictor, targets: &TargetMap, width: usize) -> Result<()> {
    let outputs = predictor.predict(&vec![0.0; width]).map_err(|e| {
        InsightError::artifact(predictor.name(), format!("probe inference failed: {}", e))
    })?;
    targets.check_width(outputs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed-width zero row
    struct Fixed {
        name: &'static str,
        width: usize,
    }

    impl Predictor for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn predict(&self, _row: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![0.0; self.width])
        }
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn parts(classifier_width: usize) -> ArtifactParts {
        let columns = names(&["Age", "Gender", "StressLevel"]);
        ArtifactParts {
            schema: FeatureSchema::new(columns.clone()).unwrap(),
            encoders: EncoderRegistry::new(),
            scaler: StandardScaler::new(columns, vec![0.0; 3], vec![1.0; 3]).unwrap(),
            classifier: Box::new(Fixed {
                name: "classifier",
                width: classifier_width,
            }),
            classification_targets: names(&["BurnoutRisk", "NeedsSupport", "HighStressFlag"]),
            regressor: Box::new(Fixed {
                name: "regressor",
                width: 2,
            }),
            regression_targets: names(&["JobSatisfaction", "ProductivityScore"]),
            attrition: None,
        }
    }

    #[test]
    fn test_assemble_valid_set() {
        let set = ArtifactSet::assemble(parts(3)).unwrap();
        assert_eq!(set.model_names(), vec!["classifier", "regressor"]);
        assert!(set.attrition.is_none());
    }

    #[test]
    fn test_target_width_disagreement() {
        let err = ArtifactSet::assemble(parts(4)).err().unwrap();
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
    fn test_attrition_scaler_derived_from_full_scaler() {
        let mut p = parts(3);
        p.attrition = Some(AttritionParts {
            predictor: Box::new(Fixed {
                name: "attrition",
                width: 1,
            }),
            columns: Some(names(&["StressLevel", "Age"])),
            scaler: None,
        });

        let set = ArtifactSet::assemble(p).unwrap();
        let attrition = set.attrition.unwrap();
        assert_eq!(attrition.schema.columns(), &names(&["StressLevel", "Age"])[..]);
        assert_eq!(attrition.scaler.feature_names(), attrition.schema.columns());
    }

    #[test]
    fn test_attrition_scaler_must_match_subset() {
        let mut p = parts(3);
        p.attrition = Some(AttritionParts {
            predictor: Box::new(Fixed {
                name: "attrition",
                width: 1,
            }),
            columns: Some(names(&["StressLevel", "Age"])),
            scaler: Some(
                StandardScaler::new(names(&["Age", "StressLevel"]), vec![0.0; 2], vec![1.0; 2])
                    .unwrap(),
            ),
        });

        let err = ArtifactSet::assemble(p).err().unwrap();
        assert!(err.to_string().contains("attrition_scaler"));
    }

    #[test]
    fn test_attrition_columns_outside_schema() {
        let mut p = parts(3);
        p.attrition = Some(AttritionParts {
            predictor: Box::new(Fixed {
                name: "attrition",
                width: 1,
            }),
            columns: Some(names(&["CommuteTime"])),
            scaler: None,
        });

        let err = ArtifactSet::assemble(p).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::ArtifactLoad);
    }

    #[test]
    fn test_scaler_schema_mismatch() {
        let mut p = parts(3);
        p.scaler = StandardScaler::new(names(&["Age", "Gender"]), vec![0.0; 2], vec![1.0; 2])
            .unwrap();
        assert!(ArtifactSet::assemble(p).is_err());
    }
}
