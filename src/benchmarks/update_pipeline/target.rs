use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::benchmarks::{BaselineSetup, UnitOfWorkProvider};
use crate::config::TargetConfig;
use crate::database::Database;
use crate::database::seed::{BaselineShape, OrdersSeedData};
use crate::orders::OrdersContext;

/// Orders database that hands out one rolled-back transaction per iteration.
#[derive(Clone, Debug)]
pub struct OrdersTarget {
    database: Arc<Database>,
}

impl OrdersTarget {
    pub async fn open(target: &TargetConfig, logical_name: &str) -> Result<Self> {
        let database = Database::new(target.database_path(logical_name)).await?;
        Ok(Self::new(Arc::new(database)))
    }

    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }
}

#[async_trait]
impl UnitOfWorkProvider for OrdersTarget {
    type Unit = OrdersContext;

    async fn acquire(&self) -> Result<OrdersContext> {
        Ok(OrdersContext::begin(&self.database).await?)
    }

    async fn release(&self, unit: OrdersContext) -> Result<()> {
        unit.rollback().await?;
        Ok(())
    }
}

/// Setup step that seeds the orders baseline.
#[derive(Debug)]
pub struct EnsureBaseline {
    database: Arc<Database>,
    shape: BaselineShape,
}

impl EnsureBaseline {
    pub fn new(database: Arc<Database>, shape: BaselineShape) -> Self {
        Self { database, shape }
    }
}

#[async_trait]
impl BaselineSetup for EnsureBaseline {
    async fn setup(&self) -> Result<()> {
        OrdersSeedData::ensure_created(&self.database, &self.shape).await?;
        Ok(())
    }
}
