//! Configuration management for the insights pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "INSIGHTS_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    /// Per-column form hints, merged over the built-in ones
    #[serde(default)]
    pub hints: Vec<FieldHint>,
}

/// Form hint override for one column
#[derive(Debug, Clone, Deserialize)]
pub struct FieldHint {
    pub column: String,
    pub hint: String,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming assessment requests
    pub request_subject: String,
    /// Subject for outgoing insight reports
    pub report_subject: String,
    /// Subject for rejected or failed requests
    pub error_subject: String,
}

/// Model and preprocessing artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing all artifact files
    pub models_dir: String,
    /// Multi-label classifier (ONNX)
    #[serde(default = "default_classifier")]
    pub classifier: String,
    /// Multi-output regressor (ONNX)
    #[serde(default = "default_regressor")]
    pub regressor: String,
    /// Attrition classifier (ONNX); skipped when unset or absent on disk
    #[serde(default = "default_attrition_model")]
    pub attrition_model: Option<String>,
    /// Fitted scaler parameters (JSON)
    #[serde(default = "default_scaler")]
    pub scaler: String,
    /// Label encoder classes (JSON)
    #[serde(default = "default_encoders")]
    pub encoders: String,
    /// Ordered feature columns (JSON)
    #[serde(default = "default_feature_columns")]
    pub feature_columns: String,
    /// Ordered attrition columns (JSON)
    #[serde(default = "default_attrition_features")]
    pub attrition_features: Option<String>,
    /// Scaler fit on the attrition columns only (JSON)
    #[serde(default = "default_attrition_scaler")]
    pub attrition_scaler: Option<String>,
    /// Output names to read; the first model output when unset
    #[serde(default)]
    pub classifier_output: Option<String>,
    #[serde(default)]
    pub regressor_output: Option<String>,
    #[serde(default)]
    pub attrition_output: Option<String>,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_classifier() -> String {
    "multi_classifier.onnx".to_string()
}

fn default_regressor() -> String {
    "multi_regressor.onnx".to_string()
}

fn default_attrition_model() -> Option<String> {
    Some("attrition_model.onnx".to_string())
}

fn default_scaler() -> String {
    "scaler.json".to_string()
}

fn default_encoders() -> String {
    "label_encoders.json".to_string()
}

fn default_feature_columns() -> String {
    "feature_columns.json".to_string()
}

fn default_attrition_features() -> Option<String> {
    Some("attrition_features.json".to_string())
}

fn default_attrition_scaler() -> Option<String> {
    Some("attrition_scaler.json".to_string())
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    /// Defaults rooted at `models_dir`
    pub fn in_dir(models_dir: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            classifier: default_classifier(),
            regressor: default_regressor(),
            attrition_model: default_attrition_model(),
            scaler: default_scaler(),
            encoders: default_encoders(),
            feature_columns: default_feature_columns(),
            attrition_features: default_attrition_features(),
            attrition_scaler: default_attrition_scaler(),
            classifier_output: None,
            regressor_output: None,
            attrition_output: None,
            onnx_threads: default_onnx_threads(),
        }
    }

    /// Full path of an artifact file
    pub fn path(&self, file: &str) -> PathBuf {
        Path::new(&self.models_dir).join(file)
    }
}

/// Output target names, in each model's output order
#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    #[serde(default = "default_classification_targets")]
    pub classification: Vec<String>,
    #[serde(default = "default_regression_targets")]
    pub regression: Vec<String>,
}

fn default_classification_targets() -> Vec<String> {
    ["BurnoutRisk", "NeedsSupport", "HighStressFlag"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_regression_targets() -> Vec<String> {
    [
        "MentalHealthDaysOff",
        "JobSatisfaction",
        "ProductivityScore",
        "WellBeingScore",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            classification: default_classification_targets(),
            regression: default_regression_targets(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests processed concurrently
    pub workers: usize,
    /// Interval between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$INSIGHTS_CONFIG` or `config/config.toml`
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "insights.requests".to_string(),
                report_subject: "insights.reports".to_string(),
                error_subject: "insights.errors".to_string(),
            },
            artifacts: ArtifactsConfig::in_dir("models"),
            targets: TargetsConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            hints: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.targets.classification.len(), 3);
        assert_eq!(config.targets.regression.len(), 4);
        assert_eq!(
            config.artifacts.attrition_model.as_deref(),
            Some("attrition_model.onnx")
        );
        assert_eq!(
            config.artifacts.path("scaler.json"),
            PathBuf::from("models/scaler.json")
        );
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
request_subject = "req"
report_subject = "rep"
error_subject = "err"

[artifacts]
models_dir = "/srv/models"
attrition_model = "attrition_xgb.onnx"

[targets]
regression = ["MentalHealthDaysOff", "JobSatisfaction", "ProductivityScore"]

[pipeline]
workers = 8

[logging]
level = "debug"
format = "pretty"

[[hints]]
column = "Age"
hint = "Age in years"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.nats.request_subject, "req");
        assert_eq!(config.artifacts.classifier, "multi_classifier.onnx");
        assert_eq!(
            config.artifacts.attrition_model.as_deref(),
            Some("attrition_xgb.onnx")
        );
        assert_eq!(config.targets.regression.len(), 3);
        assert_eq!(config.targets.classification.len(), 3);
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
        assert_eq!(config.hints.len(), 1);
        assert_eq!(config.hints[0].column, "Age");
    }
}
