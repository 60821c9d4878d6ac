//! Mental Health Insights Pipeline Library
//!
//! Loads pre-trained classifier, regressor and attrition models, assembles
//! feature vectors from employee assessment forms, and labels the predictions
//! with advisory text and recommendations.

pub mod advisory;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_builder;
pub mod form;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod types;

pub use advisory::{AdvisoryRules, ResultLabeler};
pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{ErrorKind, InsightError};
pub use feature_builder::FeatureBuilder;
pub use models::inference::InferenceEngine;
pub use pipeline::InsightPipeline;
pub use producer::ReportProducer;
pub use types::{
    input::{AssessmentRequest, RawInput},
    report::{InsightFailure, InsightReport, PredictionBundle},
};
