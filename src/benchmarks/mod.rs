pub mod core;
pub mod registry;
pub mod report;
pub mod stats;
pub mod update_pipeline;

// Re-export commonly used items for convenience
pub use self::core::{
    Aggregate, BaselineSetup, BenchmarkReport, MetricCollector, RunnerConfig, TestDefinition,
    TestDefinitionRunner, UnitOfWorkProvider, Workload,
};
pub use report::{JsonReportSink, ReportSink, TracingReportSink};
