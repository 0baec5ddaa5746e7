pub mod benchmark_config;
pub mod benchmark_result;
pub mod collector;
pub mod run_state;
pub mod runner;
pub mod test_definition;
pub mod traits;

pub use benchmark_config::RunnerConfig;
pub use benchmark_result::{Aggregate, BenchmarkReport, IterationFailure};
pub use collector::{CollectorState, MetricCollector};
pub use run_state::{Phase, RunState};
pub use runner::TestDefinitionRunner;
pub use test_definition::TestDefinition;
pub use traits::{BaselineSetup, UnitOfWorkProvider, Workload};
