use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::customers::MAX_BATCH_SIZE;
use super::{Database, DatabaseError};

/// Row counts per entity kind that a benchmark dataset must present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineShape {
    pub product_count: u32,
    pub customer_count: u32,
    pub orders_per_customer: u32,
    pub lines_per_order: u32,
}

impl BaselineShape {
    pub fn order_count(&self) -> u64 {
        self.customer_count as u64 * self.orders_per_customer as u64
    }

    pub fn line_count(&self) -> u64 {
        self.order_count() * self.lines_per_order as u64
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.lines_per_order > 0 && self.product_count == 0 {
            return Err(DatabaseError::InvalidShape(
                "order lines require at least one product".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deterministic seed data for the orders model.
///
/// Identities are positional: product, customer, order and line ids all start
/// at 1 and are assigned in creation order, so workloads can address rows by
/// index without querying for keys first.
pub struct OrdersSeedData;

impl OrdersSeedData {
    /// Makes sure `database` holds exactly `shape`.
    ///
    /// Does nothing when the current row counts already match. Otherwise every
    /// table is cleared and reseeded inside a single transaction.
    pub async fn ensure_created(
        database: &Database,
        shape: &BaselineShape,
    ) -> Result<(), DatabaseError> {
        shape.validate()?;

        if Self::current_shape_matches(database, shape).await? {
            tracing::debug!(
                target: "update_pipeline_bench::database::seed",
                "Baseline already matches {:?}",
                shape
            );
            return Ok(());
        }

        tracing::info!(
            target: "update_pipeline_bench::database::seed",
            "Seeding baseline {:?} into {}",
            shape,
            database.path.display()
        );

        let mut txn = database.pool.begin().await?;
        Self::clear(&mut txn).await?;
        Self::seed_products(&mut txn, shape).await?;
        Self::seed_customers(&mut txn, shape).await?;
        Self::seed_orders(&mut txn, shape).await?;
        txn.commit().await?;

        Ok(())
    }

    async fn current_shape_matches(
        database: &Database,
        shape: &BaselineShape,
    ) -> Result<bool, DatabaseError> {
        let products = database.count_rows("products").await?;
        let customers = database.count_rows("customers").await?;
        let orders = database.count_rows("orders").await?;
        let lines = database.count_rows("order_lines").await?;

        Ok(products == shape.product_count as i64
            && customers == shape.customer_count as i64
            && orders as u64 == shape.order_count()
            && lines as u64 == shape.line_count())
    }

    async fn clear(conn: &mut SqliteConnection) -> Result<(), DatabaseError> {
        // Children before parents, foreign keys stay enforced
        for table in ["order_lines", "orders", "customers", "products"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn seed_products(
        conn: &mut SqliteConnection,
        shape: &BaselineShape,
    ) -> Result<(), DatabaseError> {
        let ids: Vec<i64> = (1..=shape.product_count as i64).collect();
        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO products (id, name, price) ");
            builder.push_values(chunk, |mut row, id| {
                row.push_bind(*id)
                    .push_bind(format!("Product {id}"))
                    .push_bind(id * 10);
            });
            builder.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn seed_customers(
        conn: &mut SqliteConnection,
        shape: &BaselineShape,
    ) -> Result<(), DatabaseError> {
        let ids: Vec<i64> = (1..=shape.customer_count as i64).collect();
        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO customers (id, name) ");
            builder.push_values(chunk, |mut row, id| {
                row.push_bind(*id).push_bind(format!("Customer {id}"));
            });
            builder.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn seed_orders(
        conn: &mut SqliteConnection,
        shape: &BaselineShape,
    ) -> Result<(), DatabaseError> {
        if shape.orders_per_customer == 0 {
            return Ok(());
        }

        let base_date = chrono::DateTime::from_timestamp(1_420_070_400, 0)
            .unwrap_or_default()
            .timestamp_millis();

        let mut order_id: i64 = 0;
        let mut line_id: i64 = 0;
        for customer_id in 1..=shape.customer_count as i64 {
            for _ in 0..shape.orders_per_customer {
                order_id += 1;
                sqlx::query("INSERT INTO orders (id, customer_id, date) VALUES (?, ?, ?)")
                    .bind(order_id)
                    .bind(customer_id)
                    .bind(base_date + order_id * 60_000)
                    .execute(&mut *conn)
                    .await?;

                for line in 0..shape.lines_per_order as i64 {
                    line_id += 1;
                    let product_id = (order_id + line) % shape.product_count as i64 + 1;
                    sqlx::query(
                        "INSERT INTO order_lines (id, order_id, product_id, quantity, price)
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(line_id)
                    .bind(order_id)
                    .bind(product_id)
                    .bind(line + 1)
                    .bind(product_id * 10)
                    .execute(&mut *conn)
                    .await?;
                }
            }
        }
        Ok(())
    }
}
