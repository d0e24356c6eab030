use thiserror::Error;

/// Pool, schema and release failures.
///
/// Single-row process writes go through `ProcessRepository` and return
/// `sqlx::Error` as is.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("cannot open formation database pool: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("formation store statement failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Schema files missing, unreadable, or rejected by the server.
    #[error("formation schema migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}
