//! Mental Health Insights Pipeline - Main Entry Point
//!
//! Consumes assessment forms from NATS, runs the classifier, regressor and
//! attrition models, and publishes labeled insight reports.

use anyhow::{Context, Result};
use futures::StreamExt;
use mental_health_insights::{
    advisory::ResultLabeler,
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    form::describe_form,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{inference::InferenceEngine, loader::ArtifactLoader},
    pipeline::InsightPipeline,
    producer::ReportProducer,
    AssessmentRequest, InsightFailure,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("mental_health_insights={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Mental Health Insights Pipeline");
    info!(
        "Targets: classification={:?}, regression={:?}",
        config.targets.classification, config.targets.regression
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Load artifacts; any missing or inconsistent artifact is fatal
    let loader = Arc::new(ArtifactLoader::new(
        config.artifacts.clone(),
        config.targets.clone(),
    ));
    let engine = InferenceEngine::from_loader(&loader)
        .context("Failed to load model artifacts")?
        .with_metrics(metrics.clone());
    info!(
        "Inference engine initialized with {} models: {:?} ({} features)",
        engine.model_names().len(),
        engine.model_names(),
        engine.feature_count()
    );

    {
        let artifacts = engine.artifacts();
        let form = describe_form(&artifacts.schema, &artifacts.encoders, &config.hints);
        debug!(form = %serde_json::to_string(&form)?, "Assessment form");
    }

    let pipeline = Arc::new(InsightPipeline::new(engine, ResultLabeler::default()));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ReportProducer::new(
        client.clone(),
        &config.nats.report_subject,
        &config.nats.error_subject,
    ));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", consumer.subject());
    info!("Publishing reports to: {}", producer.subject());

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval);
        reporter.start().await;
    });

    // Reload all artifacts on SIGHUP
    #[cfg(unix)]
    {
        let pipeline = pipeline.clone();
        let loader = loader.clone();
        let mut hangup =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?;
        tokio::spawn(async move {
            while hangup.recv().await.is_some() {
                info!(models_dir = %loader.models_dir(), "SIGHUP received, reloading artifacts");
                let pipeline = pipeline.clone();
                let loader = loader.clone();
                let result =
                    tokio::task::spawn_blocking(move || pipeline.engine().reload(&loader)).await;
                match result {
                    Ok(Ok(())) => info!("Artifacts reloaded"),
                    Ok(Err(e)) => error!(error = %e, "Artifact reload rejected"),
                    Err(e) => error!(error = %e, "Artifact reload task failed"),
                }
            }
        });
    }

    // Process requests in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await?;

        // Clone shared resources for the spawned task
        let pipeline = pipeline.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match AssessmentRequest::from_payload(&message.payload) {
                Ok(request) => {
                    let request_id = request.request_id.clone();

                    match pipeline.assess(&request) {
                        Ok(report) => {
                            let processing_time = start_time.elapsed();
                            metrics.record_assessment(processing_time, &report);

                            if let Err(e) = producer.publish(&report).await {
                                error!(
                                    request_id = %request_id,
                                    error = %e,
                                    "Failed to publish insight report"
                                );
                            } else {
                                info!(
                                    request_id = %request_id,
                                    positive_flags = report.positive_flags(),
                                    recommendations = report.recommendations.len(),
                                    processing_time_us = processing_time.as_micros(),
                                    "Insight report published"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 assessments
                            if count % 100 == 0 {
                                let stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                                    avg_latency_us = stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            metrics.record_failure(e.kind());
                            if e.is_rejected_input() {
                                warn!(request_id = %request_id, error = %e, "Assessment rejected");
                            } else {
                                error!(request_id = %request_id, error = %e, "Assessment failed");
                            }

                            let failure = InsightFailure::from_error(request_id.clone(), &e);
                            if let Err(e) = producer.publish_failure(&failure).await {
                                error!(
                                    request_id = %request_id,
                                    error = %e,
                                    "Failed to publish insight failure"
                                );
                            }
                        }
                    }
                }
                Err(failure) => {
                    metrics.record_failure(failure.kind);
                    warn!(
                        request_id = %failure.request_id,
                        error = %failure.message,
                        "Failed to deserialize assessment request"
                    );

                    if let Err(e) = producer.publish_failure(&failure).await {
                        error!(
                            request_id = %failure.request_id,
                            error = %e,
                            "Failed to publish insight failure"
                        );
                    }
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
