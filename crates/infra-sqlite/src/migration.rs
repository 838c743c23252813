// Migration Runner

use crate::queries::map_sqlx_error;
use marketplace_core::error::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Ordered schema migrations: (version, description, SQL)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "extensions, versions and file resources",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Bring the schema up to the latest version.
///
/// Each migration runs in its own transaction together with its
/// `schema_version` row, so a failed migration leaves no trace.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;

    let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;
    debug!(current, "Schema version");

    for &(version, description, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        info!(version, description, "Applying migration");

        let mut tx = pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
    }

    Ok(())
}
