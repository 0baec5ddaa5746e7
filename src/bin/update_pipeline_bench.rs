use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;

use ::update_pipeline_bench::benchmarks::registry::BenchmarkRegistry;
use ::update_pipeline_bench::benchmarks::update_pipeline::{
    DEFAULT_BATCH_SIZE, DEFAULT_ITERATIONS, DEFAULT_WARMUP, Scenario, ScenarioOptions,
};
use ::update_pipeline_bench::benchmarks::{
    JsonReportSink, ReportSink, RunnerConfig, TracingReportSink,
};
use ::update_pipeline_bench::*;

const DATA_DIR_ENV: &str = "PERF_DATA_DIR";
const LOGS_DIR_ENV: &str = "PERF_LOGS_DIR";

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Directory for benchmark databases (falls back to PERF_DATA_DIR)
    #[clap(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Directory for logs (falls back to PERF_LOGS_DIR, then <data-dir>/logs)
    #[clap(long, value_name = "PATH")]
    logs_dir: Option<PathBuf>,

    /// Scenarios to run; all of them when omitted
    #[clap(long = "scenario", value_enum)]
    scenarios: Vec<Scenario>,

    #[clap(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    #[clap(long, default_value_t = DEFAULT_WARMUP)]
    warmup: u32,

    /// Rows added per iteration by the insert scenario
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: u32,

    #[clap(long, default_value_t = 0)]
    cooldown_ms: u64,

    /// Also write one JSON report per benchmark into this directory
    #[clap(long, value_name = "PATH")]
    json_dir: Option<PathBuf>,

    #[clap(long)]
    no_progress: bool,
}

fn resolve_dir(arg: Option<PathBuf>, env_key: &str) -> Option<PathBuf> {
    arg.or_else(|| std::env::var_os(env_key).map(PathBuf::from))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let Some(data_dir) = resolve_dir(args.data_dir, DATA_DIR_ENV) else {
        return Err(BenchmarkError::Configuration(format!(
            "no data directory: pass --data-dir or set {DATA_DIR_ENV}"
        )));
    };
    let logs_dir =
        resolve_dir(args.logs_dir, LOGS_DIR_ENV).unwrap_or_else(|| data_dir.join("logs"));

    let config = BenchConfig::new(&data_dir, &logs_dir);
    init_tracing(&config.logs_dir)?;

    tracing::info!("=== Starting Update Pipeline Benchmark Suite ===");

    let cancel = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current iteration");
            ctrl_c_flag.store(true, Ordering::SeqCst);
        }
    });

    let mut sinks: Vec<Arc<dyn ReportSink>> = vec![Arc::new(TracingReportSink)];
    if let Some(json_dir) = &args.json_dir {
        sinks.push(Arc::new(JsonReportSink::new(json_dir)));
    }

    let options = ScenarioOptions {
        iterations: args.iterations,
        warmup: args.warmup,
        batch_size: args.batch_size,
        runner: RunnerConfig {
            cooldown_between_iterations: Duration::from_millis(args.cooldown_ms),
            show_progress: !args.no_progress,
            ..RunnerConfig::default()
        },
        sinks,
        cancel: Some(cancel),
        ..ScenarioOptions::default()
    };

    let scenarios = if args.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenarios
    };

    let result = BenchmarkRegistry::run_all(&config.target(), &scenarios, &options).await;

    let exit_code = match &result {
        Ok(reports) if reports.iter().all(|r| r.is_clean()) => {
            tracing::info!("=== All Update Pipeline Benchmarks Completed Successfully ===");
            0
        }
        Ok(_) => {
            tracing::warn!("=== Benchmarks completed with failed iterations ===");
            1
        }
        Err(e) => {
            tracing::error!("Benchmark suite failed: {}", e);
            1
        }
    };

    flush_tracing();
    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
