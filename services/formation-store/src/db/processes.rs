//! Process row storage.
//!
//! `type` and `command` are written and read through their storage codecs:
//! bound as raw bytes, converted to text inside the statement, and decoded
//! from the column's wire bytes. Storage errors are returned as the driver
//! produced them.

use async_trait::async_trait;
use formation_core::{Constraints, Formation, Process, ProcessRepository, StorageScalar};
use formation_id::{ProcessId, ReleaseId};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::PgExecutor;
use tracing::{debug, instrument};

use super::columns::{converted, scalar};

const UPSERT_PROCESS: &str = r#"
    INSERT INTO processes (id, release_id, "type", quantity, command, cpu_share, memory)
    VALUES ($1, $2, convert_from($3, 'UTF8'), $4, convert_from($5, 'UTF8'), $6, $7)
    ON CONFLICT (id) DO UPDATE SET
        release_id = EXCLUDED.release_id,
        "type" = EXCLUDED."type",
        quantity = EXCLUDED.quantity,
        command = EXCLUDED.command,
        cpu_share = EXCLUDED.cpu_share,
        memory = EXCLUDED.memory
"#;

const SELECT_PROCESSES: &str = r#"
    SELECT id, release_id, "type", quantity, command, cpu_share, memory
    FROM processes
    WHERE release_id = $1
    ORDER BY id
"#;

/// Writes one process row, inserting or replacing by ID.
///
/// The row's ID and release must already be set; a missing value is
/// rejected by the table's constraints. `port` is never written.
pub async fn upsert_process<'e, E>(executor: E, process: &Process) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let memory = i64::try_from(process.constraints.memory.bytes())
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(UPSERT_PROCESS)
        .bind(process.id.map(|id| id.to_string()))
        .bind(process.release_id.map(|id| id.to_string()))
        .bind(process.process_type.to_storage_value().to_vec())
        .bind(i64::from(process.quantity))
        .bind(process.command.to_storage_value().to_vec())
        .bind(i64::from(process.constraints.cpu_share.0))
        .bind(memory)
        .execute(executor)
        .await?;

    Ok(())
}

/// Loads the process rows of one release.
pub async fn load_processes<'e, E>(
    executor: E,
    release_id: ReleaseId,
) -> Result<Vec<Process>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query(SELECT_PROCESSES)
        .bind(release_id.to_string())
        .fetch_all(executor)
        .await?;

    rows.iter().map(process_from_row).collect()
}

fn process_from_row(row: &PgRow) -> Result<Process, sqlx::Error> {
    let id = converted(row, "id", |s: String| ProcessId::parse(&s))?;
    let release_id = converted(row, "release_id", |s: String| ReleaseId::parse(&s))?;
    let quantity = converted(row, "quantity", |v: i64| u32::try_from(v))?;
    let cpu_share = converted(row, "cpu_share", |v: i64| u32::try_from(v))?;
    let memory = converted(row, "memory", |v: i64| u64::try_from(v))?;

    Ok(Process {
        release_id: Some(release_id),
        id: Some(id),
        process_type: scalar(row, "type")?,
        quantity,
        command: scalar(row, "command")?,
        constraints: Constraints::new(cpu_share, memory),
        port: None,
    })
}

/// Store for process rows.
#[derive(Clone)]
pub struct ProcessStore {
    pool: PgPool,
}

impl ProcessStore {
    /// Create a new process store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn processes_for_release(
        &self,
        release_id: ReleaseId,
    ) -> Result<Vec<Process>, sqlx::Error> {
        load_processes(&self.pool, release_id).await
    }

    /// Rebuilds the formation persisted for a release.
    #[instrument(skip(self), fields(release_id = %release_id))]
    pub async fn formation_for_release(
        &self,
        release_id: ReleaseId,
    ) -> Result<Formation, sqlx::Error> {
        let rows = self.processes_for_release(release_id).await?;
        debug!(processes = rows.len(), "Loaded formation");
        Ok(Formation::from_processes(rows))
    }
}

#[async_trait]
impl ProcessRepository for ProcessStore {
    type Error = sqlx::Error;

    #[instrument(skip(self, process), fields(process_type = %process.process_type, quantity = process.quantity))]
    async fn update_process(&self, process: &mut Process) -> Result<(), Self::Error> {
        process.id.get_or_insert_with(ProcessId::new);
        upsert_process(&self.pool, process).await
    }
}
