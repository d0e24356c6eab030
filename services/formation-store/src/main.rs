//! formation-migrate
//!
//! Applies the formation schema to the configured database and exits.
//! Run before the first release is created and after every upgrade.

use anyhow::Result;
use formation_store::{config, db::Database};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // RUST_LOG wins over FORMATION_LOG_LEVEL.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(dir = %config.database.migrations_dir.display(), "Applying formation schema");

    let db = Database::connect(&config.database)
        .await
        .inspect_err(|e| error!(error = %e, "Database unreachable"))?;
    db.migrate()
        .await
        .inspect_err(|e| error!(error = %e, "Schema migration failed"))?;
    db.ping().await?;

    Ok(())
}
