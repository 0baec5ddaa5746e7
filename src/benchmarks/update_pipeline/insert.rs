use async_trait::async_trait;

use super::expect_affected;
use crate::Result;
use crate::benchmarks::{MetricCollector, Workload};
use crate::orders::{Customer, OrdersContext};

/// Adds a fixed batch of new customers in one flush.
#[derive(Debug, Clone)]
pub struct InsertCustomers {
    count: u32,
}

impl InsertCustomers {
    pub fn new(count: u32) -> Self {
        Self { count }
    }
}

#[async_trait]
impl Workload<OrdersContext> for InsertCustomers {
    async fn run(&self, unit: &mut OrdersContext, collector: &mut MetricCollector) -> Result<u64> {
        for i in 0..self.count {
            unit.add(Customer::new(format!("New Customer {i}")))?;
        }

        collector.start()?;
        let saved = unit.save_changes().await;
        collector.stop()?;

        expect_affected(self.count as u64, saved?.total())
    }
}
