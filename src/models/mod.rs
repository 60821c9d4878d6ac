//! Artifact loading and model inference components

pub mod artifacts;
pub mod encoder;
pub mod inference;
pub mod loader;
pub mod onnx;
pub mod predictor;
pub mod scaler;
pub mod schema;
pub mod store;

pub use artifacts::ArtifactSet;
pub use inference::InferenceEngine;
pub use loader::ArtifactLoader;
pub use predictor::{Predictor, TargetMap};
