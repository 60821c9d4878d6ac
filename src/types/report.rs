//! Prediction and report data structures

use crate::error::{ErrorKind, InsightError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A classification target and its predicted flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFlag {
    pub target: String,
    pub value: bool,
}

/// A regression target and its estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEstimate {
    pub target: String,
    pub value: f64,
}

/// Raw, name-aligned outputs of one inference request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionBundle {
    /// One flag per classification target, in target order
    pub classifications: Vec<TargetFlag>,
    /// One estimate per regression target, in target order
    pub regressions: Vec<TargetEstimate>,
    /// Attrition flag when an attrition model is configured
    pub attrition: Option<bool>,
}

impl PredictionBundle {
    /// Look up a classification flag by target name
    pub fn flag(&self, target: &str) -> Option<bool> {
        self.classifications
            .iter()
            .find(|f| f.target == target)
            .map(|f| f.value)
    }

    /// Look up a regression estimate by target name
    pub fn estimate(&self, target: &str) -> Option<f64> {
        self.regressions
            .iter()
            .find(|e| e.target == target)
            .map(|e| e.value)
    }
}

/// Classification result as presented to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFlag {
    pub target: String,
    pub value: bool,
    /// "Yes" / "No"
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

/// Regression result as presented to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEstimate {
    pub target: String,
    pub value: f64,
    /// Value rounded to two decimals
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

/// Attrition outcome as presented to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionOutcome {
    pub likely_to_leave: bool,
    /// "Likely to leave" / "Not likely to leave"
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

/// A recommendation section triggered by a crossed threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub actions: Vec<String>,
}

/// Results payload published for a successful assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    /// Unique report identifier
    pub report_id: String,

    /// Associated request ID
    pub request_id: String,

    /// Classification results
    pub classifications: Vec<LabeledFlag>,

    /// Regression estimates
    pub regressions: Vec<LabeledEstimate>,

    /// Attrition result, when the attrition model is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrition: Option<AttritionOutcome>,

    /// Itemized next steps
    pub recommendations: Vec<Recommendation>,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,

    /// End-to-end processing time in microseconds
    pub processing_time_us: u64,
}

impl InsightReport {
    /// Create a new report
    pub fn new(
        request_id: String,
        classifications: Vec<LabeledFlag>,
        regressions: Vec<LabeledEstimate>,
        attrition: Option<AttritionOutcome>,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            classifications,
            regressions,
            attrition,
            recommendations: Vec::new(),
            timestamp: Utc::now(),
            processing_time_us: 0,
        }
    }

    /// Attach recommendation sections
    pub fn with_recommendations(mut self, recommendations: Vec<Recommendation>) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Record processing time
    pub fn with_processing_time(mut self, micros: u64) -> Self {
        self.processing_time_us = micros;
        self
    }

    /// Number of classification targets that came back positive
    pub fn positive_flags(&self) -> usize {
        self.classifications.iter().filter(|c| c.value).count()
    }
}

/// Payload published when an assessment cannot be served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightFailure {
    pub request_id: String,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl InsightFailure {
    pub fn new(request_id: String, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            request_id,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_error(request_id: String, error: &InsightError) -> Self {
        Self::new(request_id, error.kind(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> PredictionBundle {
        PredictionBundle {
            classifications: vec![
                TargetFlag {
                    target: "BurnoutRisk".into(),
                    value: true,
                },
                TargetFlag {
                    target: "NeedsSupport".into(),
                    value: false,
                },
            ],
            regressions: vec![TargetEstimate {
                target: "JobSatisfaction".into(),
                value: 4.5,
            }],
            attrition: Some(false),
        }
    }

    #[test]
    fn test_bundle_lookup() {
        let b = bundle();
        assert_eq!(b.flag("BurnoutRisk"), Some(true));
        assert_eq!(b.flag("NeedsSupport"), Some(false));
        assert_eq!(b.flag("HighStressFlag"), None);
        assert_eq!(b.estimate("JobSatisfaction"), Some(4.5));
        assert_eq!(b.estimate("WellBeingScore"), None);
    }

    #[test]
    fn test_report_serialization() {
        let report = InsightReport::new(
            "req_1".to_string(),
            vec![LabeledFlag {
                target: "BurnoutRisk".into(),
                value: true,
                display: "Yes".into(),
                advisory: None,
            }],
            vec![],
            None,
        )
        .with_processing_time(120);

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("\"attrition\""));
        assert!(!json.contains("\"advisory\""));

        let deserialized: InsightReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.request_id, "req_1");
        assert_eq!(deserialized.positive_flags(), 1);
        assert_eq!(deserialized.processing_time_us, 120);
    }

    #[test]
    fn test_failure_payload() {
        let err = InsightError::MissingColumn("Age".into());
        let failure = InsightFailure::from_error("req_2".into(), &err);

        let json = serde_json::to_string(&failure).unwrap();
        assert!(json.contains("\"schema_mismatch\""));

        let back: InsightFailure = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ErrorKind::SchemaMismatch);
    }
}
