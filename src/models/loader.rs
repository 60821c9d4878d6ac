//! Artifact loader

use crate::config::{ArtifactsConfig, TargetsConfig};
use crate::error::{InsightError, Result};
use crate::models::artifacts::{ArtifactParts, ArtifactSet, AttritionParts};
use crate::models::encoder::{EncoderArtifact, EncoderRegistry};
use crate::models::onnx::OnnxModel;
use crate::models::predictor::Predictor;
use crate::models::scaler::{ScalerArtifact, StandardScaler};
use crate::models::schema::FeatureSchema;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loads and validates a complete artifact set from a models directory.
pub struct ArtifactLoader {
    artifacts: ArtifactsConfig,
    targets: TargetsConfig,
}

impl ArtifactLoader {
    pub fn new(artifacts: ArtifactsConfig, targets: TargetsConfig) -> Self {
        Self { artifacts, targets }
    }

    pub fn models_dir(&self) -> &str {
        &self.artifacts.models_dir
    }

    /// Load every artifact and validate the set.
    ///
    /// Required artifacts that are missing or corrupt fail the whole load;
    /// there is no partial set.
    pub fn load(&self) -> Result<ArtifactSet> {
        let cfg = &self.artifacts;
        info!(models_dir = %cfg.models_dir, "Loading artifacts");

        let (schema, encoders, scaler) = self.load_preprocessing()?;

        let classifier = OnnxModel::load(
            cfg.path(&cfg.classifier),
            "classifier",
            cfg.classifier_output.as_deref(),
            cfg.onnx_threads,
        )?;
        let regressor = OnnxModel::load(
            cfg.path(&cfg.regressor),
            "regressor",
            cfg.regressor_output.as_deref(),
            cfg.onnx_threads,
        )?;
        let attrition = self.load_attrition()?;

        let set = ArtifactSet::assemble(ArtifactParts {
            schema,
            encoders,
            scaler,
            classifier: Box::new(classifier),
            classification_targets: self.targets.classification.clone(),
            regressor: Box::new(regressor),
            regression_targets: self.targets.regression.clone(),
            attrition,
        })?;

        info!(
            count = set.model_names().len(),
            "Loaded {} models from {}",
            set.model_names().len(),
            cfg.models_dir
        );

        Ok(set)
    }

    /// Load the schema, encoders and scaler (the JSON artifacts).
    pub fn load_preprocessing(&self) -> Result<(FeatureSchema, EncoderRegistry, StandardScaler)> {
        let cfg = &self.artifacts;

        let columns: Vec<String> = read_json(&cfg.path(&cfg.feature_columns), "feature_columns")?;
        let schema = FeatureSchema::new(columns)?;

        let encoders: EncoderArtifact = read_json(&cfg.path(&cfg.encoders), "label_encoders")?;
        let encoders = EncoderRegistry::from_classes(encoders.0)?;

        let scaler: ScalerArtifact = read_json(&cfg.path(&cfg.scaler), "scaler")?;
        let scaler = scaler.into_scaler()?;

        info!(
            features = schema.len(),
            categorical = encoders.len(),
            "Preprocessing artifacts loaded"
        );

        Ok((schema, encoders, scaler))
    }

    fn load_attrition(&self) -> Result<Option<AttritionParts>> {
        let Some(files) = self.attrition_files()? else {
            return Ok(None);
        };

        let predictor: Box<dyn Predictor> = Box::new(OnnxModel::load(
            &files.model_path,
            "attrition",
            self.artifacts.attrition_output.as_deref(),
            self.artifacts.onnx_threads,
        )?);

        Ok(Some(AttritionParts {
            predictor,
            columns: files.columns,
            scaler: files.scaler,
        }))
    }

    /// Resolve the optional attrition artifacts and read the JSON ones.
    ///
    /// Returns `None` when no attrition model is on disk; a subset or scaler
    /// without a model is ignored.
    fn attrition_files(&self) -> Result<Option<AttritionFiles>> {
        let cfg = &self.artifacts;

        let features_path = cfg
            .attrition_features
            .as_ref()
            .map(|f| cfg.path(f))
            .filter(|p| p.is_file());

        let model_path = match &cfg.attrition_model {
            None => {
                info!("No attrition model configured");
                None
            }
            Some(file) => {
                let path = cfg.path(file);
                if path.is_file() {
                    Some(path)
                } else {
                    warn!(
                        path = %path.display(),
                        "Attrition model not found, running without attrition predictions"
                    );
                    None
                }
            }
        };

        let Some(model_path) = model_path else {
            if let Some(path) = features_path {
                warn!(path = %path.display(), "Attrition features present without a model, ignoring");
            }
            return Ok(None);
        };

        let columns = match features_path {
            Some(path) => Some(read_json::<Vec<String>>(&path, "attrition_features")?),
            None => {
                warn!("Attrition model has no feature subset, feeding it the full schema");
                None
            }
        };

        let scaler = match cfg
            .attrition_scaler
            .as_ref()
            .map(|f| cfg.path(f))
            .filter(|p| p.is_file())
        {
            Some(path) => Some(read_json::<ScalerArtifact>(&path, "attrition_scaler")?.into_scaler()?),
            None => None,
        };

        Ok(Some(AttritionFiles {
            model_path,
            columns,
            scaler,
        }))
    }
}

/// Attrition artifacts found on disk, before the model is loaded
#[derive(Debug)]
struct AttritionFiles {
    model_path: PathBuf,
    columns: Option<Vec<String>>,
    scaler: Option<StandardScaler>,
}

/// Read and deserialize one JSON artifact.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, artifact: &str) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| {
        InsightError::artifact(artifact, format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        InsightError::artifact(artifact, format!("cannot parse {}: {}", path.display(), e))
    })
}
