//! Postgres storage for formations.
//!
//! [`Database`] owns the pool and applies the schema. [`ProcessStore`] and
//! [`ReleaseStore`] are handles over the same pool; clone them freely.
//! Statements are built at runtime with `sqlx::query`, so nothing here needs
//! a database at compile time.

mod columns;
mod error;
mod processes;
mod releases;

pub use error::DbError;
pub use processes::{load_processes, upsert_process, ProcessStore};
pub use releases::{Release, ReleaseStore};

use std::path::PathBuf;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Upper bound on waiting for a pooled connection.
    pub acquire_timeout: Duration,
    /// Directory holding the numbered `*.sql` schema files.
    pub migrations_dir: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/formation".to_string(),
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(5),
            migrations_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")),
        }
    }
}

/// Connection pool plus the schema it expects.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    migrations_dir: PathBuf,
}

impl Database {
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(DbError::Connect)?;

        info!("Formation database pool open");

        Ok(Self {
            pool,
            migrations_dir: config.migrations_dir.clone(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trips a trivial statement.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }

    /// Applies pending schema files; already-applied ones are skipped.
    #[instrument(skip(self), fields(dir = %self.migrations_dir.display()))]
    pub async fn migrate(&self) -> Result<(), DbError> {
        let migrator = Migrator::new(self.migrations_dir.as_path())
            .await
            .map_err(DbError::Migration)?;
        migrator.run(&self.pool).await.map_err(DbError::Migration)?;

        info!(known = migrator.iter().count(), "Formation schema up to date");
        Ok(())
    }

    pub fn process_store(&self) -> ProcessStore {
        ProcessStore::new(self.pool.clone())
    }

    pub fn release_store(&self) -> ReleaseStore {
        ReleaseStore::new(self.pool.clone())
    }
}
