//! NATS message producer for insight reports and failures

use crate::types::report::{InsightFailure, InsightReport};
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Publishes results payloads to NATS
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    report_subject: String,
    error_subject: String,
}

impl ReportProducer {
    /// Create a new report producer
    pub fn new(client: Client, report_subject: &str, error_subject: &str) -> Self {
        Self {
            client,
            report_subject: report_subject.to_string(),
            error_subject: error_subject.to_string(),
        }
    }

    /// Publish an insight report
    pub async fn publish(&self, report: &InsightReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.report_subject.clone(), payload.into())
            .await?;

        debug!(
            report_id = %report.report_id,
            request_id = %report.request_id,
            positive_flags = report.positive_flags(),
            "Published insight report"
        );

        Ok(())
    }

    /// Publish a failed request
    pub async fn publish_failure(&self, failure: &InsightFailure) -> Result<()> {
        let payload = serde_json::to_vec(failure)?;

        self.client
            .publish(self.error_subject.clone(), payload.into())
            .await?;

        debug!(
            request_id = %failure.request_id,
            kind = ?failure.kind,
            "Published insight failure"
        );

        Ok(())
    }

    /// Get the report subject name
    pub fn subject(&self) -> &str {
        &self.report_subject
    }
}
