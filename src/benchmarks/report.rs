use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::benchmarks::BenchmarkReport;

/// Destination for finished benchmark reports.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: &BenchmarkReport) -> Result<()>;
}

/// Logs a human readable summary through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn report(&self, report: &BenchmarkReport) -> Result<()> {
        let aggregate = &report.aggregate;

        tracing::info!("Benchmark: {}", report.name);
        tracing::info!("  Run:         {}", report.run_id);
        tracing::info!(
            "  Iterations:  {} measured ({} retained), {} warmup",
            report.iterations,
            aggregate.count,
            report.warmup_iterations
        );
        tracing::info!("  Total Time:  {:?}", report.total_duration);
        tracing::info!("");
        tracing::info!("  Statistics:");
        tracing::info!("    Mean:      {:?}", aggregate.mean);
        tracing::info!("    Median:    {:?}", aggregate.median);
        tracing::info!("    Std Dev:   {:?}", aggregate.std_dev);
        tracing::info!("    Min:       {:?}", aggregate.min);
        tracing::info!("    Max:       {:?}", aggregate.max);
        tracing::info!("    P95:       {:?}", aggregate.p95);
        tracing::info!("    P99:       {:?}", aggregate.p99);
        tracing::info!("");
        tracing::info!("  Throughput:  {:.2} ops/sec", report.throughput);

        if !report.failures.is_empty() {
            tracing::warn!("  Failures:    {}", report.failures.len());
            for failure in &report.failures {
                tracing::warn!(
                    "    {} #{}: expected {}, got {}{} (sample {:?}, excluded)",
                    failure.phase,
                    failure.iteration,
                    failure.expected,
                    failure.actual,
                    failure.kind.map(|kind| format!(" {kind}")).unwrap_or_default(),
                    failure.sample
                );
            }
        }
        tracing::info!("---");

        Ok(())
    }
}

/// Writes each report as pretty JSON to `<dir>/<benchmark name>.json`.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl ReportSink for JsonReportSink {
    fn report(&self, report: &BenchmarkReport) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&report.name);
        fs::write(&path, serde_json::to_vec_pretty(report)?)?;
        tracing::debug!("Wrote report for {} to {}", report.name, path.display());
        Ok(())
    }
}
