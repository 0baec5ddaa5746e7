use async_trait::async_trait;

use super::collector::MetricCollector;
use crate::Result;

/// One benchmarked mutation batch.
///
/// Implementations do their preparation untimed, bracket exactly the commit
/// with `collector.start()` / `collector.stop()`, and check the affected row
/// count before returning it.
#[async_trait]
pub trait Workload<U: Send>: Send + Sync {
    async fn run(&self, unit: &mut U, collector: &mut MetricCollector) -> Result<u64>;
}

/// Establishes the baseline dataset. Runs once per test definition.
#[async_trait]
pub trait BaselineSetup: Send + Sync {
    async fn setup(&self) -> Result<()>;
}

/// Hands out the scoped, undoable unit of work each iteration runs in.
///
/// `release` must undo everything done through the unit so the next
/// iteration sees the baseline again.
#[async_trait]
pub trait UnitOfWorkProvider: Send + Sync {
    type Unit: Send;

    async fn acquire(&self) -> Result<Self::Unit>;

    async fn release(&self, unit: Self::Unit) -> Result<()>;
}
