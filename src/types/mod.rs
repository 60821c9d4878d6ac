//! Type definitions for the insights pipeline

pub mod input;
pub mod report;

pub use input::{AssessmentRequest, FieldValue, RawInput};
pub use report::{InsightFailure, InsightReport, PredictionBundle};
