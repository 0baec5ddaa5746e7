//! Bulk mutation benchmarks over the orders model.
//!
//! Every scenario starts from 1000 seeded customers and flushes a single
//! batch of changes per iteration. Each iteration runs inside a transaction
//! that is rolled back afterwards, so all iterations see the same 1000 rows.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub mod delete;
pub mod insert;
pub mod mixed;
pub mod target;
pub mod update;

pub use delete::DeleteCustomers;
pub use insert::InsertCustomers;
pub use mixed::{MixPlan, MixedCustomers};
pub use target::{EnsureBaseline, OrdersTarget};
pub use update::UpdateCustomers;

use crate::benchmarks::core::test_definition::validate_counts;
use crate::benchmarks::{
    BenchmarkReport, ReportSink, RunnerConfig, TestDefinition, TestDefinitionRunner,
    TracingReportSink, Workload,
};
use crate::config::TargetConfig;
use crate::database::seed::BaselineShape;
use crate::orders::OrdersContext;
use crate::{BenchmarkError, Result};

pub const PIPELINE_NAME: &str = "UpdatePipeline_Simple";

/// Logical name of the dataset shared by every scenario of this pipeline
pub const DATABASE_NAME: &str = "Perf_UpdatePipeline_Simple";

pub const DEFAULT_BATCH_SIZE: u32 = 1000;
pub const DEFAULT_ITERATIONS: u32 = 100;
pub const DEFAULT_WARMUP: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Scenario {
    Insert,
    Update,
    Delete,
    Mixed,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Insert,
        Scenario::Update,
        Scenario::Delete,
        Scenario::Mixed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Insert => "Insert",
            Scenario::Update => "Update",
            Scenario::Delete => "Delete",
            Scenario::Mixed => "Mixed",
        }
    }

    /// Benchmark name in `<PipelineName>_<Scenario>` form.
    pub fn test_name(&self) -> String {
        format!("{PIPELINE_NAME}_{}", self.label())
    }

    pub fn workload(&self, options: &ScenarioOptions) -> Arc<dyn Workload<OrdersContext>> {
        let rows = options.shape.customer_count as u64;
        match self {
            Scenario::Insert => Arc::new(InsertCustomers::new(options.batch_size)),
            Scenario::Update => Arc::new(UpdateCustomers::new(rows)),
            Scenario::Delete => Arc::new(DeleteCustomers::new(rows)),
            Scenario::Mixed => Arc::new(MixedCustomers::new(rows)),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.test_name())
    }
}

/// 1000 customers and nothing else.
pub fn baseline_shape() -> BaselineShape {
    BaselineShape {
        product_count: 0,
        customer_count: 1000,
        orders_per_customer: 0,
        lines_per_order: 0,
    }
}

/// Knobs for running the pipeline scenarios.
#[derive(Clone)]
pub struct ScenarioOptions {
    pub iterations: u32,
    pub warmup: u32,
    /// Rows added by the insert scenario
    pub batch_size: u32,
    pub shape: BaselineShape,
    pub runner: RunnerConfig,
    pub sinks: Vec<Arc<dyn ReportSink>>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup: DEFAULT_WARMUP,
            batch_size: DEFAULT_BATCH_SIZE,
            shape: baseline_shape(),
            runner: RunnerConfig::default(),
            sinks: vec![Arc::new(TracingReportSink)],
            cancel: None,
        }
    }
}

impl fmt::Debug for ScenarioOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioOptions")
            .field("iterations", &self.iterations)
            .field("warmup", &self.warmup)
            .field("batch_size", &self.batch_size)
            .field("shape", &self.shape)
            .field("runner", &self.runner)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// Opens the pipeline dataset under `target` and runs one scenario against it.
pub async fn run_scenario(
    target: &TargetConfig,
    scenario: Scenario,
    options: &ScenarioOptions,
) -> Result<BenchmarkReport> {
    // Reject bad options before the dataset file is created
    validate_counts(&scenario.test_name(), options.iterations)?;
    options.shape.validate()?;

    let orders = OrdersTarget::open(target, DATABASE_NAME).await?;
    let database = orders.database().clone();

    let definition = TestDefinition::new(
        scenario.test_name(),
        options.iterations,
        options.warmup,
        Arc::new(EnsureBaseline::new(database.clone(), options.shape)),
        scenario.workload(options),
    );

    let mut runner = TestDefinitionRunner::new(orders, options.runner.clone());
    for sink in &options.sinks {
        runner = runner.with_sink(sink.clone());
    }
    if let Some(flag) = &options.cancel {
        runner = runner.with_cancellation(flag.clone());
    }

    let result = runner.run_test(&definition).await;
    database.close().await;
    result
}

pub async fn insert(target: &TargetConfig) -> Result<BenchmarkReport> {
    run_scenario(target, Scenario::Insert, &ScenarioOptions::default()).await
}

pub async fn update(target: &TargetConfig) -> Result<BenchmarkReport> {
    run_scenario(target, Scenario::Update, &ScenarioOptions::default()).await
}

pub async fn delete(target: &TargetConfig) -> Result<BenchmarkReport> {
    run_scenario(target, Scenario::Delete, &ScenarioOptions::default()).await
}

pub async fn mixed(target: &TargetConfig) -> Result<BenchmarkReport> {
    run_scenario(target, Scenario::Mixed, &ScenarioOptions::default()).await
}

pub(crate) fn expect_affected(expected: u64, actual: u64) -> Result<u64> {
    if expected != actual {
        return Err(BenchmarkError::assertion(expected, actual));
    }
    Ok(actual)
}
