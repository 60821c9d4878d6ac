//! ONNX Runtime backed models

use crate::error::{InsightError, Result};
use crate::models::predictor::Predictor;
use anyhow::Context;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing::{debug, info};

static ORT_INIT: Once = Once::new();

/// Initialize ONNX Runtime once per process.
fn init_runtime() {
    ORT_INIT.call_once(|| match ort::init().commit() {
        Ok(_) => info!("ONNX Runtime initialized"),
        // a failed init surfaces again when the first session is built
        Err(e) => tracing::warn!(error = %e, "ONNX Runtime initialization failed"),
    });
}

/// A single ONNX model with one float input `[1, width]`.
pub struct OnnxModel {
    /// Model name
    name: String,
    /// ONNX Runtime session; running needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output to read predictions from
    output_name: String,
}

impl OnnxModel {
    /// Load a model from file.
    ///
    /// `output` selects the output to read; the first declared output is used
    /// when it is `None`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        name: &str,
        output: Option<&str>,
        threads: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InsightError::artifact(
                name,
                format!("model file not found at {}", path.display()),
            ));
        }

        init_runtime();
        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = build_session(path, threads)
            .map_err(|e| InsightError::artifact(name, format!("{:#}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| InsightError::artifact(name, "model declares no inputs"))?;

        let output_name = match output {
            Some(wanted) => session
                .outputs
                .iter()
                .find(|o| o.name == wanted)
                .map(|o| o.name.clone())
                .ok_or_else(|| {
                    InsightError::artifact(name, format!("model has no output '{}'", wanted))
                })?,
            None => session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| InsightError::artifact(name, "model declares no outputs"))?,
        };

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

fn build_session(path: &Path, threads: usize) -> anyhow::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads)?
        .commit_from_file(path)
        .context(format!("Failed to load model from {:?}", path))?;
    Ok(session)
}

impl Predictor for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, row: &[f64]) -> Result<Vec<f64>> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).map_err(|e| InsightError::model(&self.name, e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InsightError::model(&self.name, format!("lock poisoned: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| InsightError::model(&self.name, e))?;

        let output = outputs.get(&self.output_name).ok_or_else(|| {
            InsightError::model(&self.name, format!("missing output '{}'", self.output_name))
        })?;

        // Regressors emit f32, classifiers usually emit i64 labels
        let values: Vec<f64> = if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            data.iter().map(|&v| v as f64).collect()
        } else if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            data.iter().map(|&v| v as f64).collect()
        } else {
            return Err(InsightError::model(
                &self.name,
                format!("output '{}' is not a f32 or i64 tensor", self.output_name),
            ));
        };

        debug!(model = %self.name, outputs = values.len(), "Model inference complete");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxModel::load(dir.path().join("nope.onnx"), "classifier", None, 1)
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::ArtifactLoad);
        assert!(err.to_string().contains("model file not found"));
    }
}
