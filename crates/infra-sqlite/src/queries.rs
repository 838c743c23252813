// SQL shared by the pool-backed store and its transactions

use chrono::{DateTime, Utc};
use marketplace_core::domain::{
    Extension, ExtensionId, ExtensionVersion, FileResource, ResourceId, VersionId,
};
use marketplace_core::error::{AppError, Result};
use sqlx::SqliteExecutor;

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE / PRIMARY KEY constraint failed
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "787" | "3850" => {
                        // FOREIGN KEY constraint failed
                        AppError::Database(format!(
                            "Foreign key constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

// ----------------------------------------------------------------------------
// Rows
// ----------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct FileResourceRow {
    id: i64,
    extension_version_id: i64,
    name: String,
    #[sqlx(rename = "type")]
    file_type: String,
    storage_type: Option<String>,
    content: Option<Vec<u8>>,
}

impl FileResourceRow {
    fn into_resource(self) -> Result<FileResource> {
        Ok(FileResource {
            id: Some(self.id),
            extension_version_id: self.extension_version_id,
            name: self.name,
            file_type: self.file_type.parse()?,
            storage_type: self.storage_type.map(|s| s.parse()).transpose()?,
            content: self.content,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExtensionRow {
    id: i64,
    namespace: String,
    name: String,
    active: bool,
    latest_version_id: Option<i64>,
    latest_prerelease_id: Option<i64>,
    last_updated: Option<DateTime<Utc>>,
}

impl ExtensionRow {
    fn into_extension(self) -> Extension {
        Extension {
            id: Some(self.id),
            namespace: self.namespace,
            name: self.name,
            active: self.active,
            latest_version_id: self.latest_version_id,
            latest_prerelease_id: self.latest_prerelease_id,
            last_updated: self.last_updated,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    id: i64,
    extension_id: i64,
    version: String,
    timestamp: DateTime<Utc>,
    active: bool,
}

impl VersionRow {
    fn into_version(self) -> ExtensionVersion {
        ExtensionVersion {
            id: Some(self.id),
            extension_id: self.extension_id,
            version: self.version,
            timestamp: self.timestamp,
            active: self.active,
        }
    }
}

// ----------------------------------------------------------------------------
// File resources
// ----------------------------------------------------------------------------

pub(crate) async fn find_file_resource<'e>(
    ex: impl SqliteExecutor<'e>,
    id: ResourceId,
) -> Result<Option<FileResource>> {
    let row = sqlx::query_as::<_, FileResourceRow>("SELECT * FROM file_resource WHERE id = ?")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(map_sqlx_error)?;

    row.map(FileResourceRow::into_resource).transpose()
}

pub(crate) async fn find_files<'e>(
    ex: impl SqliteExecutor<'e>,
    version_id: VersionId,
) -> Result<Vec<FileResource>> {
    let rows: Vec<FileResourceRow> = sqlx::query_as(
        "SELECT * FROM file_resource WHERE extension_version_id = ? ORDER BY id ASC",
    )
    .bind(version_id)
    .fetch_all(ex)
    .await
    .map_err(map_sqlx_error)?;

    rows.into_iter().map(FileResourceRow::into_resource).collect()
}

pub(crate) async fn insert_file_resource<'e>(
    ex: impl SqliteExecutor<'e>,
    resource: &FileResource,
) -> Result<ResourceId> {
    let result = sqlx::query(
        r#"
        INSERT INTO file_resource (id, extension_version_id, name, type, storage_type, content)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(resource.id)
    .bind(resource.extension_version_id)
    .bind(&resource.name)
    .bind(resource.file_type.as_str())
    .bind(resource.storage_type.map(|s| s.as_str()))
    .bind(resource.content.as_deref())
    .execute(ex)
    .await
    .map_err(map_sqlx_error)?;

    Ok(resource.id.unwrap_or_else(|| result.last_insert_rowid()))
}

pub(crate) async fn upsert_file_resource<'e>(
    ex: impl SqliteExecutor<'e>,
    resource: &FileResource,
) -> Result<ResourceId> {
    let result = sqlx::query(
        r#"
        INSERT INTO file_resource (id, extension_version_id, name, type, storage_type, content)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            extension_version_id = excluded.extension_version_id,
            name = excluded.name,
            type = excluded.type,
            storage_type = excluded.storage_type,
            content = excluded.content
        "#,
    )
    .bind(resource.id)
    .bind(resource.extension_version_id)
    .bind(&resource.name)
    .bind(resource.file_type.as_str())
    .bind(resource.storage_type.map(|s| s.as_str()))
    .bind(resource.content.as_deref())
    .execute(ex)
    .await
    .map_err(map_sqlx_error)?;

    // last_insert_rowid is only meaningful when a row was inserted
    Ok(resource.id.unwrap_or_else(|| result.last_insert_rowid()))
}

pub(crate) async fn delete_file_resource<'e>(
    ex: impl SqliteExecutor<'e>,
    id: ResourceId,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM file_resource WHERE id = ?")
        .bind(id)
        .execute(ex)
        .await
        .map_err(map_sqlx_error)?;

    Ok(result.rows_affected() > 0)
}

// ----------------------------------------------------------------------------
// Extensions
// ----------------------------------------------------------------------------

pub(crate) async fn find_extension<'e>(
    ex: impl SqliteExecutor<'e>,
    id: ExtensionId,
) -> Result<Option<Extension>> {
    let row = sqlx::query_as::<_, ExtensionRow>("SELECT * FROM extension WHERE id = ?")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(map_sqlx_error)?;

    Ok(row.map(ExtensionRow::into_extension))
}

pub(crate) async fn upsert_extension<'e>(
    ex: impl SqliteExecutor<'e>,
    extension: &Extension,
) -> Result<ExtensionId> {
    let result = sqlx::query(
        r#"
        INSERT INTO extension (
            id, namespace, name, active,
            latest_version_id, latest_prerelease_id, last_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            namespace = excluded.namespace,
            name = excluded.name,
            active = excluded.active,
            latest_version_id = excluded.latest_version_id,
            latest_prerelease_id = excluded.latest_prerelease_id,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(extension.id)
    .bind(&extension.namespace)
    .bind(&extension.name)
    .bind(extension.active)
    .bind(extension.latest_version_id)
    .bind(extension.latest_prerelease_id)
    .bind(extension.last_updated)
    .execute(ex)
    .await
    .map_err(map_sqlx_error)?;

    Ok(extension.id.unwrap_or_else(|| result.last_insert_rowid()))
}

// ----------------------------------------------------------------------------
// Extension versions
// ----------------------------------------------------------------------------

pub(crate) async fn find_version<'e>(
    ex: impl SqliteExecutor<'e>,
    id: VersionId,
) -> Result<Option<ExtensionVersion>> {
    let row = sqlx::query_as::<_, VersionRow>("SELECT * FROM extension_version WHERE id = ?")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(map_sqlx_error)?;

    Ok(row.map(VersionRow::into_version))
}

pub(crate) async fn find_versions<'e>(
    ex: impl SqliteExecutor<'e>,
    extension_id: ExtensionId,
) -> Result<Vec<ExtensionVersion>> {
    let rows: Vec<VersionRow> = sqlx::query_as(
        "SELECT * FROM extension_version WHERE extension_id = ? ORDER BY id ASC",
    )
    .bind(extension_id)
    .fetch_all(ex)
    .await
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(VersionRow::into_version).collect())
}

pub(crate) async fn upsert_version<'e>(
    ex: impl SqliteExecutor<'e>,
    version: &ExtensionVersion,
) -> Result<VersionId> {
    let result = sqlx::query(
        r#"
        INSERT INTO extension_version (id, extension_id, version, timestamp, active)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            extension_id = excluded.extension_id,
            version = excluded.version,
            timestamp = excluded.timestamp,
            active = excluded.active
        "#,
    )
    .bind(version.id)
    .bind(version.extension_id)
    .bind(&version.version)
    .bind(version.timestamp)
    .bind(version.active)
    .execute(ex)
    .await
    .map_err(map_sqlx_error)?;

    Ok(version.id.unwrap_or_else(|| result.last_insert_rowid()))
}
