// SQLite Transaction Implementation

use crate::queries::{self, map_sqlx_error};
use async_trait::async_trait;
use marketplace_core::domain::{
    Extension, ExtensionId, ExtensionVersion, FileResource, ResourceId, VersionId,
};
use marketplace_core::error::Result;
use marketplace_core::port::{EntityTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

/// Unit of work over one pooled connection.
///
/// Dropping it without `commit` rolls back (sqlx semantics).
pub struct SqliteEntityTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteEntityTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteEntityTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl EntityTransaction for SqliteEntityTransaction<'_> {
    async fn find_files(&mut self, version_id: VersionId) -> Result<Vec<FileResource>> {
        queries::find_files(&mut *self.tx, version_id).await
    }

    async fn persist_resource(&mut self, resource: &FileResource) -> Result<ResourceId> {
        queries::insert_file_resource(&mut *self.tx, resource).await
    }

    async fn merge_resource(&mut self, resource: &FileResource) -> Result<ResourceId> {
        queries::upsert_file_resource(&mut *self.tx, resource).await
    }

    async fn remove_resource(&mut self, id: ResourceId) -> Result<bool> {
        queries::delete_file_resource(&mut *self.tx, id).await
    }

    async fn find_extension(&mut self, id: ExtensionId) -> Result<Option<Extension>> {
        queries::find_extension(&mut *self.tx, id).await
    }

    async fn merge_extension(&mut self, extension: &Extension) -> Result<ExtensionId> {
        queries::upsert_extension(&mut *self.tx, extension).await
    }

    async fn find_versions(&mut self, extension_id: ExtensionId) -> Result<Vec<ExtensionVersion>> {
        queries::find_versions(&mut *self.tx, extension_id).await
    }

    async fn merge_version(&mut self, version: &ExtensionVersion) -> Result<VersionId> {
        queries::upsert_version(&mut *self.tx, version).await
    }
}
