use async_trait::async_trait;

use super::expect_affected;
use crate::Result;
use crate::benchmarks::{MetricCollector, Workload};
use crate::orders::OrdersContext;

/// Removes every customer.
#[derive(Debug, Clone)]
pub struct DeleteCustomers {
    expected_rows: u64,
}

impl DeleteCustomers {
    pub fn new(expected_rows: u64) -> Self {
        Self { expected_rows }
    }
}

#[async_trait]
impl Workload<OrdersContext> for DeleteCustomers {
    async fn run(&self, unit: &mut OrdersContext, collector: &mut MetricCollector) -> Result<u64> {
        for customer in unit.query_customers().await? {
            unit.remove(&customer)?;
        }

        collector.start()?;
        let saved = unit.save_changes().await;
        collector.stop()?;

        expect_affected(self.expected_rows, saved?.total())
    }
}
