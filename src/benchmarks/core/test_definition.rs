use std::sync::Arc;

use super::traits::{BaselineSetup, Workload};
use crate::{BenchmarkError, Result};

/// Describes one named benchmark: how to build its baseline, what to run,
/// and how many times.
pub struct TestDefinition<U: Send> {
    name: String,
    iteration_count: u32,
    warmup_count: u32,
    setup: Arc<dyn BaselineSetup>,
    workload: Arc<dyn Workload<U>>,
}

impl<U: Send> TestDefinition<U> {
    pub fn new(
        name: impl Into<String>,
        iteration_count: u32,
        warmup_count: u32,
        setup: Arc<dyn BaselineSetup>,
        workload: Arc<dyn Workload<U>>,
    ) -> Self {
        Self {
            name: name.into(),
            iteration_count,
            warmup_count,
            setup,
            workload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn warmup_count(&self) -> u32 {
        self.warmup_count
    }

    pub fn setup(&self) -> &dyn BaselineSetup {
        self.setup.as_ref()
    }

    pub fn workload(&self) -> &dyn Workload<U> {
        self.workload.as_ref()
    }

    pub fn validate(&self) -> Result<()> {
        validate_counts(&self.name, self.iteration_count)
    }
}

/// Checks a definition's name and measured iteration count.
///
/// Callers that need to acquire resources before a [`TestDefinition`] can be
/// built run this first.
pub fn validate_counts(name: &str, iteration_count: u32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BenchmarkError::Configuration(
            "test definition needs a name".to_string(),
        ));
    }
    if iteration_count == 0 {
        return Err(BenchmarkError::Configuration(format!(
            "'{name}' must run at least one measured iteration"
        )));
    }
    Ok(())
}

impl<U: Send> std::fmt::Debug for TestDefinition<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDefinition")
            .field("name", &self.name)
            .field("iteration_count", &self.iteration_count)
            .field("warmup_count", &self.warmup_count)
            .finish_non_exhaustive()
    }
}
