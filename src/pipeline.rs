//! End-to-end assessment: form in, report out.

use crate::advisory::ResultLabeler;
use crate::error::Result;
use crate::models::inference::InferenceEngine;
use crate::types::input::AssessmentRequest;
use crate::types::report::InsightReport;
use std::time::Instant;

/// Runs inference on a request and labels the outcome.
pub struct InsightPipeline {
    engine: InferenceEngine,
    labeler: ResultLabeler,
}

impl InsightPipeline {
    pub fn new(engine: InferenceEngine, labeler: ResultLabeler) -> Self {
        Self { engine, labeler }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Serve one assessment. Any encoding, schema or model failure aborts
    /// the whole request.
    pub fn assess(&self, request: &AssessmentRequest) -> Result<InsightReport> {
        let start = Instant::now();
        let bundle = self.engine.predict(&request.values)?;
        let report = self.labeler.label(request.request_id.clone(), &bundle);
        Ok(report.with_processing_time(start.elapsed().as_micros() as u64))
    }
}
