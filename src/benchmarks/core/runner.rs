use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use super::benchmark_config::RunnerConfig;
use super::benchmark_result::{BenchmarkReport, IterationFailure};
use super::collector::MetricCollector;
use super::run_state::{Phase, RunState, RunTracker};
use super::test_definition::TestDefinition;
use super::traits::UnitOfWorkProvider;
use crate::benchmarks::report::ReportSink;
use crate::{BenchmarkError, Result};

enum IterationOutcome {
    Passed(MetricCollector),
    Failed(IterationFailure),
}

/// Drives a [`TestDefinition`]: setup once, warmup, measured iterations,
/// then hands the report to every registered sink.
///
/// Every iteration runs inside a unit of work from the provider, which is
/// released on every exit path so the next iteration starts from the baseline.
pub struct TestDefinitionRunner<P: UnitOfWorkProvider> {
    provider: P,
    config: RunnerConfig,
    sinks: Vec<Arc<dyn ReportSink>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<P: UnitOfWorkProvider> TestDefinitionRunner<P> {
    pub fn new(provider: P, config: RunnerConfig) -> Self {
        Self {
            provider,
            config,
            sinks: Vec::new(),
            cancel: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Stops the run at the next iteration boundary once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn run_test(&self, definition: &TestDefinition<P::Unit>) -> Result<BenchmarkReport> {
        definition.validate()?;

        let name = definition.name();
        let mut tracker = RunTracker::new(name);
        let started_at = Utc::now();

        tracker.advance(RunState::SettingUp);
        tracing::info!("Setting up benchmark: {}", name);
        if let Err(e) = definition.setup().setup().await {
            tracker.advance(RunState::Aborted);
            tracing::error!("Setup failed for {}: {}", name, e);
            return Err(BenchmarkError::Setup {
                benchmark: name.to_string(),
                source: Box::new(e),
            });
        }

        let mut failures = Vec::new();

        tracker.advance(RunState::Warmup);
        if definition.warmup_count() > 0 {
            tracing::info!("Running {} warmup iterations...", definition.warmup_count());
            let pb = self.progress_bar(definition.warmup_count(), Phase::Warmup);

            for iteration in 0..definition.warmup_count() {
                let outcome = self
                    .checked_iteration(definition, Phase::Warmup, iteration, 0, &mut tracker)
                    .await?;
                // Warmup samples are never retained
                if let IterationOutcome::Failed(failure) = outcome {
                    failures.push(failure);
                }
                pb.inc(1);
                self.cooldown().await;
            }

            pb.finish_with_message("Warmup complete");
        }

        tracker.advance(RunState::Measuring);
        tracing::info!(
            "Running {} benchmark iterations...",
            definition.iteration_count()
        );
        let pb = self.progress_bar(definition.iteration_count(), Phase::Measured);
        let mut retained = MetricCollector::new();
        let overall_start = Instant::now();

        for iteration in 0..definition.iteration_count() {
            let outcome = self
                .checked_iteration(definition, Phase::Measured, iteration, iteration, &mut tracker)
                .await?;
            match outcome {
                IterationOutcome::Passed(collector) => retained.absorb(collector)?,
                IterationOutcome::Failed(failure) => failures.push(failure),
            }
            pb.inc(1);
            self.cooldown().await;
        }

        pb.finish_with_message("Benchmark complete");
        let total_duration = overall_start.elapsed();

        tracker.advance(RunState::Reporting);
        let report = BenchmarkReport::new(
            name.to_string(),
            started_at,
            definition.iteration_count(),
            definition.warmup_count(),
            retained.aggregate()?,
            failures,
            total_duration,
        );
        for sink in &self.sinks {
            if let Err(e) = sink.report(&report) {
                tracing::error!("Report sink failed for {}: {}", name, e);
            }
        }

        tracker.advance(RunState::Done);
        Ok(report)
    }

    /// Runs one iteration after honouring cancellation, aborting the tracker
    /// on any fatal error.
    async fn checked_iteration(
        &self,
        definition: &TestDefinition<P::Unit>,
        phase: Phase,
        iteration: u32,
        completed: u32,
        tracker: &mut RunTracker<'_>,
    ) -> Result<IterationOutcome> {
        if self.is_cancelled() {
            tracker.advance(RunState::Aborted);
            tracing::warn!("{} cancelled before {} iteration {}", definition.name(), phase, iteration);
            return Err(BenchmarkError::Cancelled {
                benchmark: definition.name().to_string(),
                completed,
            });
        }

        match self.run_iteration(definition, phase, iteration).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracker.advance(RunState::Aborted);
                tracing::error!("{}", e);
                Err(e)
            }
        }
    }

    async fn run_iteration(
        &self,
        definition: &TestDefinition<P::Unit>,
        phase: Phase,
        iteration: u32,
    ) -> Result<IterationOutcome> {
        let name = definition.name();
        let aborted = |source: BenchmarkError| BenchmarkError::Aborted {
            benchmark: name.to_string(),
            phase,
            iteration,
            source: Box::new(source),
        };

        let mut unit = match tokio::time::timeout(self.config.acquire_timeout, self.provider.acquire())
            .await
        {
            Ok(Ok(unit)) => unit,
            Ok(Err(e)) => {
                return Err(BenchmarkError::ResourceAcquisition {
                    benchmark: name.to_string(),
                    phase,
                    iteration,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(BenchmarkError::ResourceAcquisition {
                    benchmark: name.to_string(),
                    phase,
                    iteration,
                    reason: format!("timed out after {:?}", self.config.acquire_timeout),
                });
            }
        };

        let mut collector = MetricCollector::new();
        let outcome = definition.workload().run(&mut unit, &mut collector).await;
        let released = self.provider.release(unit).await;

        match outcome {
            Ok(affected) => {
                released.map_err(aborted)?;
                if let Err(e) = collector.aggregate() {
                    return Err(aborted(e));
                }
                // Exactly one timed commit per iteration keeps count == N
                if collector.len() != 1 {
                    return Err(aborted(BenchmarkError::SampleCount {
                        recorded: collector.len(),
                    }));
                }
                tracing::debug!(
                    "{} {} iteration {}: {} rows in {:?}",
                    name,
                    phase,
                    iteration,
                    affected,
                    collector.last_sample()
                );
                Ok(IterationOutcome::Passed(collector))
            }
            Err(BenchmarkError::WorkloadAssertion {
                kind,
                expected,
                actual,
            }) => {
                released.map_err(aborted)?;
                let message = BenchmarkError::WorkloadAssertion {
                    kind,
                    expected,
                    actual,
                }
                .to_string();
                tracing::warn!("{} {} iteration {} failed: {}", name, phase, iteration, message);
                Ok(IterationOutcome::Failed(IterationFailure {
                    phase,
                    iteration,
                    kind,
                    expected,
                    actual,
                    message,
                    sample: collector.last_sample(),
                }))
            }
            Err(e) => {
                if let Err(release_error) = released {
                    tracing::error!(
                        "Releasing unit of work after failed iteration also failed: {}",
                        release_error
                    );
                }
                Err(aborted(e))
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    async fn cooldown(&self) {
        if !self.config.cooldown_between_iterations.is_zero() {
            tokio::time::sleep(self.config.cooldown_between_iterations).await;
        }
    }

    fn progress_bar(&self, len: u32, phase: Phase) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let (template, chars, message) = match phase {
            Phase::Warmup => (
                "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                "=>-",
                "Warmup",
            ),
            Phase::Measured => (
                "{msg} [{bar:40.green/blue}] {pos}/{len} ({percent}%) - ETA: {eta}",
                "##-",
                "Benchmarking",
            ),
        };

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(chars),
        );
        pb.set_message(message);
        pb
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::benchmarks::core::{BaselineSetup, Workload};

    /// In-memory baseline: a row counter that units mutate and release restores.
    #[derive(Default)]
    struct CountingProvider {
        baseline_rows: u64,
        acquired: AtomicU32,
        released: AtomicU32,
        fail_acquire_at: Option<u32>,
    }

    struct CountingUnit {
        rows: u64,
    }

    #[async_trait]
    impl UnitOfWorkProvider for CountingProvider {
        type Unit = CountingUnit;

        async fn acquire(&self) -> Result<CountingUnit> {
            let n = self.acquired.fetch_add(1, Ordering::SeqCst);
            if self.fail_acquire_at == Some(n) {
                return Err(BenchmarkError::Configuration("pool exhausted".to_string()));
            }
            Ok(CountingUnit {
                rows: self.baseline_rows,
            })
        }

        async fn release(&self, _unit: CountingUnit) -> Result<()> {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSetup {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl BaselineSetup for CountingSetup {
        async fn setup(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BenchmarkError::Configuration("no database".to_string()));
            }
            Ok(())
        }
    }

    /// Deletes every row; optionally reports a wrong count on chosen calls.
    #[derive(Default)]
    struct DeleteAll {
        calls: AtomicU32,
        short_on_calls: Vec<u32>,
        leave_running: bool,
        skip_timing: bool,
        extra_sections: u32,
    }

    #[async_trait]
    impl Workload<CountingUnit> for DeleteAll {
        async fn run(&self, unit: &mut CountingUnit, collector: &mut MetricCollector) -> Result<u64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let expected = unit.rows;

            if self.skip_timing {
                unit.rows = 0;
                return Ok(expected);
            }

            collector.start()?;
            let mut affected = unit.rows;
            unit.rows = 0;
            if self.leave_running {
                return Ok(affected);
            }
            collector.stop()?;

            for _ in 0..self.extra_sections {
                collector.start()?;
                collector.stop()?;
            }

            if self.short_on_calls.contains(&call) {
                affected -= 1;
            }
            if affected != expected {
                return Err(BenchmarkError::assertion(expected, affected));
            }
            Ok(affected)
        }
    }

    struct RecordingSink {
        reports: Mutex<Vec<BenchmarkReport>>,
    }

    impl ReportSink for RecordingSink {
        fn report(&self, report: &BenchmarkReport) -> Result<()> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn provider(rows: u64) -> CountingProvider {
        CountingProvider {
            baseline_rows: rows,
            ..CountingProvider::default()
        }
    }

    fn definition(
        iterations: u32,
        warmup: u32,
        setup: Arc<CountingSetup>,
        workload: Arc<DeleteAll>,
    ) -> TestDefinition<CountingUnit> {
        TestDefinition::new("Counting_Delete", iterations, warmup, setup, workload)
    }

    #[tokio::test]
    async fn test_setup_once_and_workload_n_plus_w_times() {
        let setup = Arc::new(CountingSetup::default());
        let workload = Arc::new(DeleteAll::default());
        let runner = TestDefinitionRunner::new(provider(1000), RunnerConfig::quiet());

        let report = runner
            .run_test(&definition(100, 5, setup.clone(), workload.clone()))
            .await
            .unwrap();

        assert_eq!(setup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(workload.calls.load(Ordering::SeqCst), 105);
        assert_eq!(report.aggregate.count, 100);
        assert_eq!(report.iterations, 100);
        assert_eq!(report.warmup_iterations, 5);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_every_unit_is_released() {
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet());
        let workload = Arc::new(DeleteAll {
            short_on_calls: vec![1, 3],
            ..DeleteAll::default()
        });

        runner
            .run_test(&definition(4, 2, Arc::new(CountingSetup::default()), workload))
            .await
            .unwrap();

        let provider = runner.provider();
        assert_eq!(provider.acquired.load(Ordering::SeqCst), 6);
        assert_eq!(provider.released.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_zero_iterations_is_rejected_before_setup() {
        let setup = Arc::new(CountingSetup::default());
        let workload = Arc::new(DeleteAll::default());
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet());

        let result = runner
            .run_test(&definition(0, 5, setup.clone(), workload.clone()))
            .await;

        assert!(matches!(result, Err(BenchmarkError::Configuration(_))));
        assert_eq!(setup.calls.load(Ordering::SeqCst), 0);
        assert_eq!(runner.provider().acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_setup_failure_aborts_run() {
        let setup = Arc::new(CountingSetup {
            fail: true,
            ..CountingSetup::default()
        });
        let workload = Arc::new(DeleteAll::default());
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet());

        let result = runner
            .run_test(&definition(3, 1, setup, workload.clone()))
            .await;

        assert!(matches!(result, Err(BenchmarkError::Setup { .. })));
        assert_eq!(workload.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_assertion_failure_does_not_stop_later_iterations() {
        // Call indices include the 2 warmup calls, so call 4 is measured iteration 2
        let workload = Arc::new(DeleteAll {
            short_on_calls: vec![4],
            ..DeleteAll::default()
        });
        let runner = TestDefinitionRunner::new(provider(1000), RunnerConfig::quiet());

        let report = runner
            .run_test(&definition(5, 2, Arc::new(CountingSetup::default()), workload.clone()))
            .await
            .unwrap();

        assert_eq!(workload.calls.load(Ordering::SeqCst), 7);
        assert_eq!(report.aggregate.count, 4);
        assert_eq!(report.failures.len(), 1);

        let failure = &report.failures[0];
        assert_eq!(failure.phase, Phase::Measured);
        assert_eq!(failure.iteration, 2);
        assert_eq!(failure.kind, None);
        assert_eq!(failure.expected, 1000);
        assert_eq!(failure.actual, 999);
        assert!(failure.sample.is_some());
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_warmup_failure_is_recorded_but_not_measured() {
        let workload = Arc::new(DeleteAll {
            short_on_calls: vec![0],
            ..DeleteAll::default()
        });
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet());

        let report = runner
            .run_test(&definition(3, 1, Arc::new(CountingSetup::default()), workload))
            .await
            .unwrap();

        assert_eq!(report.aggregate.count, 3);
        assert_eq!(report.failures[0].phase, Phase::Warmup);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_acquisition_failure_is_fatal() {
        let runner = TestDefinitionRunner::new(
            CountingProvider {
                baseline_rows: 10,
                fail_acquire_at: Some(2),
                ..CountingProvider::default()
            },
            RunnerConfig::quiet(),
        );
        let workload = Arc::new(DeleteAll::default());

        let result = runner
            .run_test(&definition(5, 0, Arc::new(CountingSetup::default()), workload.clone()))
            .await;

        match result {
            Err(BenchmarkError::ResourceAcquisition {
                benchmark,
                phase,
                iteration,
                ..
            }) => {
                assert_eq!(benchmark, "Counting_Delete");
                assert_eq!(phase, Phase::Measured);
                assert_eq!(iteration, 2);
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.name)),
        }
        assert_eq!(workload.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unstopped_collector_is_fatal() {
        let workload = Arc::new(DeleteAll {
            leave_running: true,
            ..DeleteAll::default()
        });
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet());

        let result = runner
            .run_test(&definition(2, 0, Arc::new(CountingSetup::default()), workload))
            .await;

        match result {
            Err(BenchmarkError::Aborted { source, .. }) => {
                assert!(matches!(*source, BenchmarkError::CollectorState { .. }));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.name)),
        }
        assert_eq!(runner.provider().released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_acquisition_failure_in_warmup_names_phase() {
        let runner = TestDefinitionRunner::new(
            CountingProvider {
                baseline_rows: 10,
                fail_acquire_at: Some(1),
                ..CountingProvider::default()
            },
            RunnerConfig::quiet(),
        );

        let result = runner
            .run_test(&definition(
                5,
                3,
                Arc::new(CountingSetup::default()),
                Arc::new(DeleteAll::default()),
            ))
            .await;

        assert!(matches!(
            result,
            Err(BenchmarkError::ResourceAcquisition {
                phase: Phase::Warmup,
                iteration: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_untimed_iteration_is_fatal() {
        let workload = Arc::new(DeleteAll {
            skip_timing: true,
            ..DeleteAll::default()
        });
        let runner = TestDefinitionRunner::new(provider(1000), RunnerConfig::quiet());

        let result = runner
            .run_test(&definition(100, 5, Arc::new(CountingSetup::default()), workload.clone()))
            .await;

        match result {
            Err(BenchmarkError::Aborted {
                phase,
                iteration,
                source,
                ..
            }) => {
                assert_eq!(phase, Phase::Warmup);
                assert_eq!(iteration, 0);
                assert!(matches!(*source, BenchmarkError::SampleCount { recorded: 0 }));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.aggregate.count)),
        }
        assert_eq!(workload.calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.provider().released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_iteration_timed_twice_is_fatal() {
        let workload = Arc::new(DeleteAll {
            extra_sections: 1,
            ..DeleteAll::default()
        });
        let runner = TestDefinitionRunner::new(provider(1000), RunnerConfig::quiet());

        let result = runner
            .run_test(&definition(100, 0, Arc::new(CountingSetup::default()), workload))
            .await;

        match result {
            Err(BenchmarkError::Aborted { phase, source, .. }) => {
                assert_eq!(phase, Phase::Measured);
                assert!(matches!(*source, BenchmarkError::SampleCount { recorded: 2 }));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.aggregate.count)),
        }
    }

    #[tokio::test]
    async fn test_cancellation_is_honoured_at_iteration_boundary() {
        let flag = Arc::new(AtomicBool::new(true));
        let workload = Arc::new(DeleteAll::default());
        let runner = TestDefinitionRunner::new(provider(10), RunnerConfig::quiet())
            .with_cancellation(flag);

        let result = runner
            .run_test(&definition(3, 0, Arc::new(CountingSetup::default()), workload.clone()))
            .await;

        assert!(matches!(
            result,
            Err(BenchmarkError::Cancelled { completed: 0, .. })
        ));
        assert_eq!(workload.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_report_is_handed_to_sinks() {
        let sink = Arc::new(RecordingSink {
            reports: Mutex::new(Vec::new()),
        });
        let runner = TestDefinitionRunner::new(
            provider(10),
            RunnerConfig {
                cooldown_between_iterations: Duration::from_millis(1),
                ..RunnerConfig::quiet()
            },
        )
        .with_sink(sink.clone());

        let report = runner
            .run_test(&definition(
                3,
                1,
                Arc::new(CountingSetup::default()),
                Arc::new(DeleteAll::default()),
            ))
            .await
            .unwrap();

        let recorded = sink.reports.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].run_id, report.run_id);
        assert!(report.total_duration >= Duration::from_millis(3));
    }
}
