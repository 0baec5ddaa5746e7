use async_trait::async_trait;

use super::expect_affected;
use crate::Result;
use crate::benchmarks::{MetricCollector, Workload};
use crate::orders::OrdersContext;

/// Appends " Modified" to every customer name.
#[derive(Debug, Clone)]
pub struct UpdateCustomers {
    expected_rows: u64,
}

impl UpdateCustomers {
    pub fn new(expected_rows: u64) -> Self {
        Self { expected_rows }
    }
}

#[async_trait]
impl Workload<OrdersContext> for UpdateCustomers {
    async fn run(&self, unit: &mut OrdersContext, collector: &mut MetricCollector) -> Result<u64> {
        for mut customer in unit.query_customers().await? {
            customer.name.push_str(" Modified");
            unit.update(&customer)?;
        }

        collector.start()?;
        let saved = unit.save_changes().await;
        collector.stop()?;

        expect_affected(self.expected_rows, saved?.total())
    }
}
