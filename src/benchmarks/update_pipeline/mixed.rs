use async_trait::async_trait;

use super::expect_affected;
use crate::benchmarks::{MetricCollector, Workload};
use crate::orders::{Customer, OrdersContext};
use crate::{BenchmarkError, Result};

/// How many rows of each kind a mixed batch over `n` rows touches.
///
/// Index `i` in `[0, n)` is deleted when `i % 3 == 0` and modified when
/// `i % 3 == 1`; one new row is inserted per remaining index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixPlan {
    pub deletes: u64,
    pub updates: u64,
    pub inserts: u64,
}

impl MixPlan {
    pub fn for_rows(n: u64) -> Self {
        Self {
            deletes: n.div_ceil(3),
            updates: (n + 1) / 3,
            inserts: n / 3,
        }
    }

    pub fn total(&self) -> u64 {
        self.deletes + self.updates + self.inserts
    }
}

/// Deletes, modifies and inserts customers in a single flush.
#[derive(Debug, Clone)]
pub struct MixedCustomers {
    expected_rows: u64,
}

impl MixedCustomers {
    pub fn new(expected_rows: u64) -> Self {
        Self { expected_rows }
    }
}

#[async_trait]
impl Workload<OrdersContext> for MixedCustomers {
    async fn run(&self, unit: &mut OrdersContext, collector: &mut MetricCollector) -> Result<u64> {
        let plan = MixPlan::for_rows(self.expected_rows);
        let customers = unit.query_customers().await?;

        for i in 0..plan.inserts {
            unit.add(Customer::new(format!("New Customer {i}")))?;
        }
        for customer in customers.iter().step_by(3) {
            unit.remove(customer)?;
        }
        for customer in customers.iter().skip(1).step_by(3) {
            let mut modified = customer.clone();
            modified.name.push_str(" Modified");
            unit.update(&modified)?;
        }

        collector.start()?;
        let saved = unit.save_changes().await;
        collector.stop()?;
        let saved = saved?;

        for (kind, expected, actual) in [
            ("deletes", plan.deletes, saved.deleted),
            ("updates", plan.updates, saved.updated),
            ("inserts", plan.inserts, saved.inserted),
        ] {
            if expected != actual {
                return Err(BenchmarkError::WorkloadAssertion {
                    kind: Some(kind),
                    expected,
                    actual,
                });
            }
        }

        expect_affected(self.expected_rows, saved.total())
    }
}
