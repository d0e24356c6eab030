//! Column decoding through the core codecs.

use formation_core::{StorageScalar, StorageValue};
use sqlx::postgres::PgRow;
use sqlx::{Row, ValueRef};

pub(crate) fn column_error<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

/// Decodes a column from its raw wire bytes.
pub(crate) fn scalar<T: StorageScalar>(row: &PgRow, column: &str) -> Result<T, sqlx::Error> {
    let raw = row.try_get_raw(column)?;
    let value = if raw.is_null() {
        StorageValue::Null
    } else {
        let bytes = raw.as_bytes().map_err(|source| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source,
        })?;
        StorageValue::Bytes(bytes)
    };

    T::from_storage_value(value).map_err(|e| column_error(column, e))
}

/// Reads a column and converts it, reporting failures against the column.
pub(crate) fn converted<'r, S, T, E>(
    row: &'r PgRow,
    column: &str,
    convert: impl FnOnce(S) -> Result<T, E>,
) -> Result<T, sqlx::Error>
where
    S: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    E: std::error::Error + Send + Sync + 'static,
{
    let value: S = row.try_get(column)?;
    convert(value).map_err(|e| column_error(column, e))
}
