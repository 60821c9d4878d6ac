//! Test Assessment Producer
//!
//! Generates synthetic assessment forms from the artifacts' schema and
//! publishes them to NATS for pipeline testing.

use mental_health_insights::config::ArtifactsConfig;
use mental_health_insights::config::TargetsConfig;
use mental_health_insights::form::{describe_form, FieldKind, FormDescriptor};
use mental_health_insights::models::loader::ArtifactLoader;
use mental_health_insights::types::input::{AssessmentRequest, FieldValue, RawInput};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Form generator for testing
struct FormGenerator {
    form: FormDescriptor,
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl FormGenerator {
    fn new(form: FormDescriptor) -> Self {
        Self {
            form,
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a form with every field filled in plausibly
    fn generate_valid(&mut self) -> AssessmentRequest {
        self.request_counter += 1;

        let mut values = RawInput::new();
        for field in &self.form.fields {
            let value = match &field.kind {
                FieldKind::Categorical { options } => {
                    FieldValue::Label(options[self.rng.gen_range(0..options.len())].clone())
                }
                FieldKind::Numeric => {
                    let (low, high) = hint_range(&field.hint).unwrap_or((0.0, 10.0));
                    FieldValue::Number(self.rng.gen_range(low..=high).round())
                }
            };
            values.insert(field.column.clone(), value);
        }

        AssessmentRequest {
            request_id: format!("emp_{:08}", self.request_counter),
            values,
        }
    }

    /// Generate a form with one categorical field set to an unknown label
    fn generate_invalid(&mut self) -> AssessmentRequest {
        let mut request = self.generate_valid();
        let categorical: Vec<&str> = self
            .form
            .fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Categorical { .. }))
            .map(|f| f.column.as_str())
            .collect();

        if !categorical.is_empty() {
            let column = categorical[self.rng.gen_range(0..categorical.len())];
            request.values.insert(column, "Not-A-Known-Category");
        }
        request
    }
}

/// Parse a numeric range such as `(18-65)` or `(1 = low, 10 = high)` out of
/// a form hint.
fn hint_range(hint: &str) -> Option<(f64, f64)> {
    let inner = hint.rsplit_once('(')?.1.split_once(')')?.0;
    let numbers: Vec<f64> = inner
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter_map(|s| s.parse().ok())
        .collect();
    match numbers.as_slice() {
        [low, high, ..] if low < high => Some((*low, *high)),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Assessment Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("insights.requests");
    let models_dir = args.get(3).map(|s| s.as_str()).unwrap_or("models");
    let count: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);
    let invalid_rate: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let delay_ms: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        models_dir = %models_dir,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // The form layout comes from the same artifacts the pipeline serves
    let loader = ArtifactLoader::new(ArtifactsConfig::in_dir(models_dir), TargetsConfig::default());
    let (schema, encoders, _) = loader.load_preprocessing()?;
    let form = describe_form(&schema, &encoders, &[]);
    info!(fields = form.fields.len(), "Form layout loaded");

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(form, count, invalid_rate, delay_ms).await;
        }
    };

    let mut generator = FormGenerator::new(form);
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} assessments...", count);

    let mut valid_count = 0;
    let mut invalid_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            invalid_count += 1;
            generator.generate_invalid()
        } else {
            valid_count += 1;
            generator.generate_valid()
        };

        let payload = serde_json::to_vec(&request)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} assessments ({} valid, {} invalid)",
                i + 1,
                count,
                valid_count,
                invalid_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} assessments ({} valid, {} invalid)",
        count, valid_count, invalid_count
    );

    Ok(())
}

async fn run_dry_mode(
    form: FormDescriptor,
    count: u64,
    invalid_rate: f64,
    delay_ms: u64,
) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = FormGenerator::new(form);
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample assessment {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_range() {
        assert_eq!(hint_range("Age in years (18-65)"), Some((18.0, 65.0)));
        assert_eq!(
            hint_range("Self-rated stress level (1 = low, 10 = high)"),
            Some((1.0, 10.0))
        );
        assert_eq!(hint_range("Company size (e.g., 1-10, 11-50...)"), Some((1.0, 10.0)));
        assert_eq!(hint_range("No range here"), None);
    }
}
