//! Multi-model inference engine

use crate::error::{InsightError, Result};
use crate::feature_builder::FeatureBuilder;
use crate::metrics::PipelineMetrics;
use crate::models::artifacts::ArtifactSet;
use crate::models::loader::ArtifactLoader;
use crate::models::predictor::Predictor;
use crate::models::store::ArtifactStore;
use crate::types::input::RawInput;
use crate::types::report::{PredictionBundle, TargetEstimate, TargetFlag};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Classifier outputs at or above this value count as a positive flag.
///
/// Label outputs (0/1) and probability outputs both map correctly.
pub const FLAG_THRESHOLD: f64 = 0.5;

/// Runs the classifier, regressor and attrition model against the active
/// artifact set.
pub struct InferenceEngine {
    store: ArtifactStore,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl InferenceEngine {
    pub fn new(artifacts: ArtifactSet) -> Self {
        Self {
            store: ArtifactStore::new(artifacts),
            metrics: None,
        }
    }

    /// Load artifacts from disk and build an engine over them
    pub fn from_loader(loader: &ArtifactLoader) -> Result<Self> {
        Ok(Self::new(loader.load()?))
    }

    /// Record per-model latency into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of the active artifact set
    pub fn artifacts(&self) -> Arc<ArtifactSet> {
        self.store.current()
    }

    /// Reload all artifacts; the active set is kept if loading fails.
    pub fn reload(&self, loader: &ArtifactLoader) -> Result<()> {
        self.store.reload_with(|| loader.load())
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        self.store.current().model_names()
    }

    /// Number of features the models consume
    pub fn feature_count(&self) -> usize {
        self.store.current().schema.len()
    }

    /// Run every configured model on one form.
    pub fn predict(&self, input: &RawInput) -> Result<PredictionBundle> {
        let artifacts = self.store.current();
        self.predict_with(&artifacts, input)
    }

    /// Run inference on a batch of forms
    pub fn predict_batch(&self, inputs: &[RawInput]) -> Vec<Result<PredictionBundle>> {
        let artifacts = self.store.current();
        inputs
            .iter()
            .map(|input| self.predict_with(&artifacts, input))
            .collect()
    }

    fn predict_with(&self, artifacts: &ArtifactSet, input: &RawInput) -> Result<PredictionBundle> {
        let builder = FeatureBuilder::new(&artifacts.encoders);

        let encoded = builder.build(&artifacts.schema, input)?;
        let scaled = artifacts.scaler.transform(&encoded)?;

        let raw = self.run_model(artifacts.classifier.predictor.as_ref(), &scaled)?;
        let classifications = artifacts
            .classifier
            .targets
            .label(&raw)?
            .map(|(target, value)| TargetFlag {
                target: target.to_string(),
                value: value >= FLAG_THRESHOLD,
            })
            .collect();

        let raw = self.run_model(artifacts.regressor.predictor.as_ref(), &scaled)?;
        let regressions = artifacts
            .regressor
            .targets
            .label(&raw)?
            .map(|(target, value)| TargetEstimate {
                target: target.to_string(),
                value,
            })
            .collect();

        let attrition = match &artifacts.attrition {
            Some(model) => {
                let encoded = builder.build_subset(&model.schema, input)?;
                let scaled = model.scaler.transform(&encoded)?;
                let raw = self.run_model(model.predictor.as_ref(), &scaled)?;
                let (_, value) = model
                    .target
                    .label(&raw)?
                    .next()
                    .ok_or_else(|| InsightError::mismatch("attrition output", 1, 0))?;
                Some(value >= FLAG_THRESHOLD)
            }
            None => None,
        };

        let bundle = PredictionBundle {
            classifications,
            regressions,
            attrition,
        };

        debug!(
            classifications = ?bundle.classifications,
            regressions = ?bundle.regressions,
            attrition = ?bundle.attrition,
            "Inference complete"
        );

        Ok(bundle)
    }

    /// Run a single model, rejecting non-finite outputs
    fn run_model(&self, model: &dyn Predictor, row: &[f64]) -> Result<Vec<f64>> {
        let start = Instant::now();
        let outputs = model.predict(row)?;

        if let Some(metrics) = &self.metrics {
            metrics.record_model_time(model.name(), start.elapsed());
        }

        if outputs.iter().any(|v| !v.is_finite()) {
            return Err(InsightError::model(model.name(), "produced a non-finite output"));
        }
        Ok(outputs)
    }
}
