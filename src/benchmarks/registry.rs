use std::time::{Duration, Instant};

use crate::Result;
use crate::benchmarks::BenchmarkReport;
use crate::benchmarks::update_pipeline::{self, Scenario, ScenarioOptions};
use crate::config::TargetConfig;

pub struct BenchmarkRegistry;

impl BenchmarkRegistry {
    /// Runs the selected scenarios one after another.
    ///
    /// A failing benchmark does not stop the ones after it. The first error is
    /// returned once everything has run and the summary has been logged.
    pub async fn run_all(
        target: &TargetConfig,
        scenarios: &[Scenario],
        options: &ScenarioOptions,
    ) -> Result<Vec<BenchmarkReport>> {
        let overall_start = Instant::now();
        let mut results = Vec::new();
        let mut first_error = None;

        tracing::info!("=== Running Update Pipeline Benchmarks ===");

        for scenario in scenarios {
            match update_pipeline::run_scenario(target, *scenario, options).await {
                Ok(report) => results.push(report),
                Err(e) => {
                    tracing::error!("Benchmark {} failed: {}", scenario, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        Self::print_summary(&results, overall_start.elapsed());

        match first_error {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }

    fn print_summary(results: &[BenchmarkReport], overall_duration: Duration) {
        if results.is_empty() {
            return;
        }

        tracing::info!("=== Benchmark Results Summary ===");
        for result in results {
            tracing::info!(
                "{:<32} n={:<4} mean={:?} p95={:?} failures={}",
                result.name,
                result.aggregate.count,
                result.aggregate.mean,
                result.aggregate.p95,
                result.failures.len()
            );
        }
        tracing::info!("Total Benchmarks: {}", results.len());
        tracing::info!("Overall Duration: {:?}", overall_duration);
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::benchmarks::RunnerConfig;

    #[tokio::test]
    async fn test_run_all_runs_selected_scenarios_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let target = TargetConfig::new(temp_dir.path());
        let options = ScenarioOptions {
            iterations: 2,
            warmup: 0,
            runner: RunnerConfig::quiet(),
            sinks: Vec::new(),
            ..ScenarioOptions::default()
        };

        let reports = BenchmarkRegistry::run_all(
            &target,
            &[Scenario::Delete, Scenario::Insert],
            &options,
        )
        .await
        .unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["UpdatePipeline_Simple_Delete", "UpdatePipeline_Simple_Insert"]
        );
    }

    #[tokio::test]
    async fn test_run_all_keeps_going_and_returns_first_error() {
        let temp_dir = TempDir::new().unwrap();
        let target = TargetConfig::new(temp_dir.path());
        let options = ScenarioOptions {
            iterations: 0,
            runner: RunnerConfig::quiet(),
            sinks: Vec::new(),
            ..ScenarioOptions::default()
        };

        let result =
            BenchmarkRegistry::run_all(&target, &[Scenario::Insert, Scenario::Mixed], &options)
                .await;

        assert!(matches!(
            result,
            Err(crate::BenchmarkError::Configuration(message)) if message.contains("Insert")
        ));
    }
}
