/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root.
/// Each migration is an `{version}_{name}.up.sql` / `.down.sql` pair and
/// is embedded into the binary at compile time.

use sqlx::postgres::PgPool;
use tracing::info;

/// Embedded migrator for the workspace `migrations/` directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../migrations");

/// Runs all pending database migrations
///
/// Safe to call on every startup; already-applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database migrations up to date");
    Ok(())
}
