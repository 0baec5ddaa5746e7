use crate::benchmarks::core::{CollectorState, Phase};
use crate::database::DatabaseError;
use crate::orders::ContextError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, BenchmarkError>;

#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Setup failed for benchmark '{benchmark}': {source}")]
    Setup {
        benchmark: String,
        #[source]
        source: Box<BenchmarkError>,
    },

    #[error("Collector state error: expected {expected:?}, found {actual:?}")]
    CollectorState {
        expected: CollectorState,
        actual: CollectorState,
    },

    #[error("Iteration recorded {recorded} timed samples, expected exactly one")]
    SampleCount { recorded: usize },

    #[error(
        "Could not acquire a unit of work for benchmark '{benchmark}' at {phase} iteration {iteration}: {reason}"
    )]
    ResourceAcquisition {
        benchmark: String,
        phase: Phase,
        iteration: u32,
        reason: String,
    },

    #[error("Affected row count mismatch{}: expected {expected}, got {actual}", kind_suffix(.kind))]
    WorkloadAssertion {
        kind: Option<&'static str>,
        expected: u64,
        actual: u64,
    },

    #[error("Benchmark '{benchmark}' aborted during {phase} iteration {iteration}: {source}")]
    Aborted {
        benchmark: String,
        phase: Phase,
        iteration: u32,
        #[source]
        source: Box<BenchmarkError>,
    },

    #[error("Benchmark '{benchmark}' cancelled after {completed} iterations")]
    Cancelled { benchmark: String, completed: u32 },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Data context error: {0}")]
    Context(#[from] ContextError),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

fn kind_suffix(kind: &Option<&'static str>) -> String {
    kind.map(|kind| format!(" for {kind}")).unwrap_or_default()
}

impl BenchmarkError {
    /// Shorthand for a total affected-row mismatch.
    pub fn assertion(expected: u64, actual: u64) -> Self {
        Self::WorkloadAssertion {
            kind: None,
            expected,
            actual,
        }
    }
}
