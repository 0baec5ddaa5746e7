use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::orders::Customer;

/// Maximum rows bound into a single multi-row INSERT or DELETE statement.
pub(crate) const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug)]
pub(crate) struct CustomerRow {
    pub id: i64,
    pub name: String,
}

impl<'r, R> sqlx::FromRow<'r, R> for CustomerRow
where
    R: sqlx::Row,
    &'r str: sqlx::ColumnIndex<R>,
    String: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    fn from_row(row: &'r R) -> std::result::Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        Ok(CustomerRow { id, name })
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: Some(row.id),
            name: row.name,
        }
    }
}

/// Loads every customer ordered by id so callers can address rows by position.
pub(crate) async fn load_all(conn: &mut SqliteConnection) -> Result<Vec<Customer>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerRow>("SELECT id, name FROM customers ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Customer::from).collect())
}

/// Inserts new customers with multi-row statements, returning rows affected.
pub(crate) async fn insert_batch(
    conn: &mut SqliteConnection,
    customers: &[Customer],
) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for chunk in customers.chunks(MAX_BATCH_SIZE) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO customers (name) ");
        builder.push_values(chunk, |mut row, customer| {
            row.push_bind(customer.name.clone());
        });
        affected += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(affected)
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE customers SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_batch(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for chunk in ids.chunks(MAX_BATCH_SIZE) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM customers WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        affected += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(affected)
}
