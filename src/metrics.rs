//! Performance metrics and statistics tracking for the insights pipeline.

use crate::error::ErrorKind;
use crate::types::report::InsightReport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total assessments served
    pub assessments_processed: AtomicU64,
    /// Total requests that failed
    pub assessments_failed: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Positive classification flags by target
    positives_by_target: RwLock<HashMap<String, u64>>,
    /// Assessments predicted likely to leave
    attrition_positive: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            assessments_processed: AtomicU64::new(0),
            assessments_failed: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            positives_by_target: RwLock::new(HashMap::new()),
            attrition_positive: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a served assessment
    pub fn record_assessment(&self, processing_time: Duration, report: &InsightReport) {
        self.assessments_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut positives) = self.positives_by_target.write() {
            for flag in report.classifications.iter().filter(|f| f.value) {
                *positives.entry(flag.target.clone()).or_insert(0) += 1;
            }
        }

        if report.attrition.as_ref().is_some_and(|a| a.likely_to_leave) {
            self.attrition_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: ErrorKind) {
        self.assessments_failed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(format!("{:?}", kind)).or_insert(0) += 1;
        }
    }

    /// Record model inference time
    pub fn record_model_time(&self, model_name: &str, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(model_name.to_string()).or_default();
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap_or_else(|e| e.into_inner());
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get model performance stats
    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        let times = self.model_times.read().unwrap_or_else(|e| e.into_inner());
        let mut stats = HashMap::new();

        for (model, model_times) in times.iter() {
            if model_times.is_empty() {
                continue;
            }

            let mut sorted: Vec<u64> = model_times.clone();
            sorted.sort_unstable();

            let sum: u64 = sorted.iter().sum();
            let count = sorted.len();

            stats.insert(
                model.clone(),
                ModelStats {
                    calls: count as u64,
                    mean_us: sum / count as u64,
                    p50_us: sorted[count / 2],
                    p99_us: sorted[(count as f64 * 0.99) as usize],
                },
            );
        }

        stats
    }

    /// Get current throughput (assessments per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessments_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get positive flag counts by target
    pub fn get_positives_by_target(&self) -> HashMap<String, u64> {
        self.positives_by_target
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get failure counts by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.assessments_processed.load(Ordering::Relaxed);
        let failed = self.assessments_failed.load(Ordering::Relaxed);
        let attrition = self.attrition_positive.load(Ordering::Relaxed);
        let failure_rate = if served + failed > 0 {
            (failed as f64 / (served + failed) as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          MENTAL HEALTH INSIGHTS - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Assessments Served:     {:>8}  │  Throughput: {:>6.1} req/s ║",
            served, throughput
        );
        info!(
            "║ Requests Failed:        {:>8}  │  Failure Rate: {:>6.1}%   ║",
            failed, failure_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Positive Flags by Target:                                    ║");
        for (target, count) in &self.get_positives_by_target() {
            let pct = if served > 0 {
                (*count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:16}: {:>6} ({:>5.1}%)                          ║", target, count, pct);
        }
        info!("║   {:16}: {:>6}                                    ║", "LikelyToLeave", attrition);
        let failures = self.get_failures_by_kind();
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &failures {
                info!("║   {:16}: {:>6}                                    ║", kind, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        // Model-specific stats
        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (μs):");
            for (model, stats) in &model_stats {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    model, stats.mean_us, stats.p50_us, stats.p99_us, stats.calls
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Model-specific statistics
#[derive(Debug)]
pub struct ModelStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::{AttritionOutcome, LabeledFlag};

    fn report(burnout: bool, leaving: bool) -> InsightReport {
        InsightReport::new(
            "req".to_string(),
            vec![LabeledFlag {
                target: "BurnoutRisk".into(),
                value: burnout,
                display: if burnout { "Yes" } else { "No" }.into(),
                advisory: None,
            }],
            vec![],
            Some(AttritionOutcome {
                likely_to_leave: leaving,
                display: String::new(),
                advisory: None,
            }),
        )
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), &report(true, false));
        metrics.record_assessment(Duration::from_micros(200), &report(true, true));
        metrics.record_assessment(Duration::from_micros(300), &report(false, false));
        metrics.record_failure(ErrorKind::Encoding);

        assert_eq!(metrics.assessments_processed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.assessments_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_positives_by_target()["BurnoutRisk"], 2);
        assert_eq!(metrics.attrition_positive.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_failures_by_kind()["Encoding"], 1);

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_model_stats() {
        let metrics = PipelineMetrics::new();
        metrics.record_model_time("classifier", Duration::from_micros(50));
        metrics.record_model_time("classifier", Duration::from_micros(150));

        let stats = metrics.get_model_stats();
        assert_eq!(stats["classifier"].calls, 2);
        assert_eq!(stats["classifier"].mean_us, 100);
    }
}
