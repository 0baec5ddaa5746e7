use sqlx::{SqlitePool, migrate::Migrator, sqlite::SqlitePoolOptions};
use std::{path::PathBuf, sync::LazyLock, time::Duration};
use thiserror::Error;

pub mod customers;
pub mod seed;

pub static MIGRATOR: LazyLock<Migrator> = LazyLock::new(|| sqlx::migrate!("./db_migrations"));

const DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DB_MAX_CONNECTIONS: u32 = 4;
const DB_BUSY_TIMEOUT_MS: u32 = 5000;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),
    #[error("Invalid baseline shape: {0}")]
    InvalidShape(String),
}

/// Handle to one benchmark dataset stored in its own SQLite file.
#[derive(Clone, Debug)]
pub struct Database {
    pub pool: SqlitePool,
    pub path: PathBuf,
}

impl Database {
    /// Opens (creating if needed) the dataset at `db_path` and brings its
    /// schema up to date.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // SQLite creates the file but not the directories above it
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        tracing::debug!("Opening benchmark dataset {:?}", db_url);

        let pool = Self::create_connection_pool(&db_url).await?;

        // Migrations are embedded, so every dataset file gets the same schema
        MIGRATOR.run(&pool).await?;

        Ok(Self {
            pool,
            path: db_path,
        })
    }

    /// Creates and configures a SQLite connection pool
    async fn create_connection_pool(db_url: &str) -> Result<SqlitePool, DatabaseError> {
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS))
            .max_connections(DB_MAX_CONNECTIONS)
            .after_connect(|conn, _| {
                Box::pin(async move {
                    let conn = &mut *conn;
                    // WAL lets the seed check read while an iteration holds a write transaction
                    sqlx::query("PRAGMA journal_mode=WAL")
                        .execute(&mut *conn)
                        .await?;
                    // Set busy timeout for lock contention
                    sqlx::query(&format!("PRAGMA busy_timeout={DB_BUSY_TIMEOUT_MS}"))
                        .execute(&mut *conn)
                        .await?;
                    // Cascading deletes from customers depend on this
                    sqlx::query("PRAGMA foreign_keys = ON")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(db_url)
            .await?;
        Ok(pool)
    }

    /// Number of rows currently stored in `table`.
    pub async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
