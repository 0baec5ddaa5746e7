use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::run_state::Phase;
use crate::benchmarks::stats;

/// Summary statistics over the retained samples of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub count: usize,
    pub total: Duration,
    pub mean: Duration,
    pub median: Duration,
    pub std_dev: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl Aggregate {
    pub fn from_samples(samples: &[Duration]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort();

        let mean = stats::calculate_mean(samples);

        Self {
            count: samples.len(),
            total: samples.iter().sum(),
            mean,
            median: stats::calculate_median(&sorted),
            std_dev: stats::calculate_std_dev(samples, mean),
            min: sorted.first().copied().unwrap_or(Duration::ZERO),
            max: sorted.last().copied().unwrap_or(Duration::ZERO),
            p95: stats::calculate_percentile(&sorted, 0.95),
            p99: stats::calculate_percentile(&sorted, 0.99),
        }
    }
}

/// An iteration whose affected-row assertion failed.
///
/// Its sample, when the commit was timed, is kept here and excluded from the
/// aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationFailure {
    pub phase: Phase,
    pub iteration: u32,
    /// Change kind for per-kind checks (mixed batches), `None` for the total
    pub kind: Option<&'static str>,
    pub expected: u64,
    pub actual: u64,
    pub message: String,
    pub sample: Option<Duration>,
}

/// Results from running one test definition
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub iterations: u32,
    pub warmup_iterations: u32,
    pub aggregate: Aggregate,
    pub failures: Vec<IterationFailure>,
    /// Wall time of the measured phase, including cooldown between iterations
    pub total_duration: Duration,
    pub throughput: f64, // successful measured iterations per second
}

impl BenchmarkReport {
    pub fn new(
        name: String,
        started_at: DateTime<Utc>,
        iterations: u32,
        warmup_iterations: u32,
        aggregate: Aggregate,
        failures: Vec<IterationFailure>,
        total_duration: Duration,
    ) -> Self {
        let throughput = stats::calculate_throughput(aggregate.count as u32, total_duration);
        Self {
            run_id: Uuid::new_v4(),
            name,
            started_at,
            iterations,
            warmup_iterations,
            aggregate,
            failures,
            total_duration,
            throughput,
        }
    }

    pub fn measured_failures(&self) -> impl Iterator<Item = &IterationFailure> {
        self.failures
            .iter()
            .filter(|failure| failure.phase == Phase::Measured)
    }

    /// True when every measured iteration passed its assertion.
    pub fn is_clean(&self) -> bool {
        self.measured_failures().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_from_samples() {
        let samples = vec![
            Duration::from_millis(30),
            Duration::from_millis(10),
            Duration::from_millis(20),
        ];

        let aggregate = Aggregate::from_samples(&samples);

        assert_eq!(aggregate.count, 3);
        assert_eq!(aggregate.mean, Duration::from_millis(20));
        assert_eq!(aggregate.median, Duration::from_millis(20));
        assert_eq!(aggregate.min, Duration::from_millis(10));
        assert_eq!(aggregate.max, Duration::from_millis(30));
        assert_eq!(aggregate.total, Duration::from_millis(60));
    }

    #[test]
    fn test_aggregate_from_no_samples() {
        let aggregate = Aggregate::from_samples(&[]);
        assert_eq!(aggregate.count, 0);
        assert_eq!(aggregate.mean, Duration::ZERO);
        assert_eq!(aggregate.max, Duration::ZERO);
    }

    #[test]
    fn test_report_throughput_uses_retained_samples() {
        let aggregate = Aggregate::from_samples(&[Duration::from_millis(5); 10]);
        let report = BenchmarkReport::new(
            "bench".to_string(),
            Utc::now(),
            10,
            0,
            aggregate,
            Vec::new(),
            Duration::from_secs(2),
        );

        assert_eq!(report.throughput, 5.0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_warmup_failures_do_not_make_report_dirty() {
        let report = BenchmarkReport::new(
            "bench".to_string(),
            Utc::now(),
            1,
            1,
            Aggregate::from_samples(&[Duration::from_millis(1)]),
            vec![IterationFailure {
                phase: Phase::Warmup,
                iteration: 0,
                kind: None,
                expected: 10,
                actual: 9,
                message: "mismatch".to_string(),
                sample: None,
            }],
            Duration::from_millis(1),
        );

        assert!(report.is_clean());
        assert_eq!(report.failures.len(), 1);
    }
}
