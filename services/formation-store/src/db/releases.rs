//! Release storage and release creation.
//!
//! Creating a release reads the application's current formation,
//! reconciles it against the new command map and writes the result. Two
//! creations for the same application must not interleave, or one would
//! overwrite the other's scale, so each runs in a transaction holding an
//! advisory lock keyed on the application ID.

use chrono::{DateTime, Utc};
use formation_core::{CommandMap, Formation, StorageScalar};
use formation_id::{AppId, ReleaseId};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{PgExecutor, Row};
use tracing::{info, instrument};

use super::columns::{converted, scalar};
use super::processes::{load_processes, upsert_process};
use super::DbError;

/// A persisted release.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub release_id: ReleaseId,
    pub app_id: AppId,
    /// Per-application sequence number, starting at 1.
    pub version: i64,
    pub commands: CommandMap,
    pub created_at: DateTime<Utc>,
}

const SELECT_RELEASE: &str = r#"
    SELECT release_id, app_id, version, process_types::text AS process_types, created_at
    FROM releases
"#;

fn release_from_row(row: &PgRow) -> Result<Release, sqlx::Error> {
    Ok(Release {
        release_id: converted(row, "release_id", |s: String| ReleaseId::parse(&s))?,
        app_id: converted(row, "app_id", |s: String| AppId::parse(&s))?,
        version: row.try_get("version")?,
        commands: scalar(row, "process_types")?,
        created_at: row.try_get("created_at")?,
    })
}

async fn fetch_latest<'e, E>(executor: E, app_id: AppId) -> Result<Option<Release>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("{SELECT_RELEASE} WHERE app_id = $1 ORDER BY version DESC LIMIT 1");
    let row = sqlx::query(&query)
        .bind(app_id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(release_from_row).transpose()
}

/// Store for releases.
#[derive(Clone)]
pub struct ReleaseStore {
    pool: PgPool,
}

impl ReleaseStore {
    /// Create a new release store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the next release of an application and its formation.
    ///
    /// Scale and size of process types that remain declared are carried
    /// over from the application's latest release. Either the release and
    /// all of its process rows are written, or nothing is.
    #[instrument(skip(self, commands), fields(app_id = %app_id, process_types = commands.len()))]
    pub async fn create_release(
        &self,
        app_id: AppId,
        commands: CommandMap,
    ) -> Result<(Release, Formation), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        // Held until commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(app_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;

        let latest = fetch_latest(&mut *tx, app_id)
            .await
            .map_err(DbError::Query)?;

        let prior = match &latest {
            Some(release) => Some(Formation::from_processes(
                load_processes(&mut *tx, release.release_id)
                    .await
                    .map_err(DbError::Query)?,
            )),
            None => None,
        };

        let version = latest.as_ref().map_or(1, |r| r.version + 1);
        let release_id = ReleaseId::new();

        let mut formation = Formation::reconcile(prior.as_ref(), &commands);
        formation.bind_release(release_id);

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO releases (release_id, app_id, version, process_types)
            VALUES ($1, $2, $3, convert_from($4, 'UTF8')::hstore)
            RETURNING created_at
            "#,
        )
        .bind(release_id.to_string())
        .bind(app_id.to_string())
        .bind(version)
        .bind(commands.to_storage_value().to_vec())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        for process in formation.processes() {
            upsert_process(&mut *tx, process)
                .await
                .map_err(DbError::Query)?;
        }

        tx.commit().await.map_err(DbError::Query)?;

        info!(
            release_id = %release_id,
            version,
            processes = formation.len(),
            "Release created"
        );

        let release = Release {
            release_id,
            app_id,
            version,
            commands,
            created_at,
        };

        Ok((release, formation))
    }

    /// The application's highest-versioned release.
    pub async fn latest_release(&self, app_id: AppId) -> Result<Option<Release>, DbError> {
        fetch_latest(&self.pool, app_id)
            .await
            .map_err(DbError::Query)
    }

    pub async fn get_release(&self, release_id: ReleaseId) -> Result<Option<Release>, DbError> {
        let query = format!("{SELECT_RELEASE} WHERE release_id = $1");
        let row = sqlx::query(&query)
            .bind(release_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        row.as_ref()
            .map(release_from_row)
            .transpose()
            .map_err(DbError::Query)
    }

    /// The command map declared by a release.
    pub async fn command_map(&self, release_id: ReleaseId) -> Result<Option<CommandMap>, DbError> {
        Ok(self
            .get_release(release_id)
            .await?
            .map(|release| release.commands))
    }
}
