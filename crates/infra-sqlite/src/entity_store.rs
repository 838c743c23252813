// SQLite EntityStore Implementation

use crate::queries::{self, map_sqlx_error};
use crate::SqliteEntityTransaction;
use async_trait::async_trait;
use marketplace_core::domain::{
    Extension, ExtensionId, ExtensionVersion, FileResource, ResourceId, VersionId,
};
use marketplace_core::error::Result;
use marketplace_core::port::{EntityStore, EntityTransaction, TransactionalEntityStore};
use sqlx::SqlitePool;
use tracing::trace;

pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn find_file_resource(&self, id: ResourceId) -> Result<Option<FileResource>> {
        queries::find_file_resource(&self.pool, id).await
    }

    async fn find_extension_version(&self, id: VersionId) -> Result<Option<ExtensionVersion>> {
        queries::find_version(&self.pool, id).await
    }

    async fn find_extension(&self, id: ExtensionId) -> Result<Option<Extension>> {
        queries::find_extension(&self.pool, id).await
    }
}

#[async_trait]
impl TransactionalEntityStore for SqliteEntityStore {
    async fn begin_transaction(&self) -> Result<Box<dyn EntityTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        trace!("Transaction started");
        Ok(Box::new(SqliteEntityTransaction::new(tx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use chrono::Utc;
    use marketplace_core::domain::{FileType, StorageType};
    use marketplace_core::error::AppError;

    async fn setup() -> (SqliteEntityStore, VersionId) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteEntityStore::new(pool);

        let mut tx = store.begin_transaction().await.unwrap();
        let ext_id = tx
            .merge_extension(&Extension::new("redhat", "java"))
            .await
            .unwrap();
        let version_id = tx
            .merge_version(&ExtensionVersion::new(ext_id, "1.0.0", Utc::now()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        (store, version_id)
    }

    #[tokio::test]
    async fn test_persist_and_find_resource() {
        let (store, version_id) = setup().await;
        let res = FileResource::new(version_id, "README.md", FileType::Readme, b"# Java".to_vec());

        let mut tx = store.begin_transaction().await.unwrap();
        let id = tx.persist_resource(&res).await.unwrap();
        tx.commit().await.unwrap();

        let found = store.find_file_resource(id).await.unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.file_type, FileType::Readme);
        assert_eq!(found.storage_type, None);
        assert_eq!(found.content.as_deref(), Some(&b"# Java"[..]));
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let (store, _) = setup().await;
        assert!(store.find_file_resource(9999).await.unwrap().is_none());
        assert!(store.find_extension_version(9999).await.unwrap().is_none());
        assert!(store.find_extension(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_existing_id_conflicts() {
        let (store, version_id) = setup().await;
        let mut res = FileResource::new(version_id, "icon.png", FileType::Icon, vec![0x89]);

        let mut tx = store.begin_transaction().await.unwrap();
        res.id = Some(tx.persist_resource(&res).await.unwrap());
        let err = tx.persist_resource(&res).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_merge_updates_in_place() {
        let (store, version_id) = setup().await;
        let mut res = FileResource::new(version_id, "ext.vsix", FileType::Download, vec![1, 2]);

        let mut tx = store.begin_transaction().await.unwrap();
        res.id = Some(tx.merge_resource(&res).await.unwrap());
        res.storage_type = Some(StorageType::Local);
        res.content = None;
        let id = tx.merge_resource(&res).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(Some(id), res.id);
        let found = store.find_file_resource(id).await.unwrap().unwrap();
        assert_eq!(found.storage_type, Some(StorageType::Local));
        assert!(found.content.is_none());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (store, version_id) = setup().await;
        let res = FileResource::new(version_id, "LICENSE", FileType::License, b"MIT".to_vec());

        let id = {
            let mut tx = store.begin_transaction().await.unwrap();
            tx.persist_resource(&res).await.unwrap()
            // dropped without commit
        };

        assert!(store.find_file_resource(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_files_and_remove() {
        let (store, version_id) = setup().await;

        let mut tx = store.begin_transaction().await.unwrap();
        for (name, t) in [("a.vsix", FileType::Download), ("CHANGELOG.md", FileType::Changelog)] {
            tx.persist_resource(&FileResource::new(version_id, name, t, vec![0]))
                .await
                .unwrap();
        }
        let files = tx.find_files(version_id).await.unwrap();
        assert_eq!(files.len(), 2);

        let first = files[0].id.unwrap();
        assert!(tx.remove_resource(first).await.unwrap());
        assert!(!tx.remove_resource(first).await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        assert_eq!(tx.find_files(version_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_requires_existing_version() {
        let (store, _) = setup().await;
        let res = FileResource::new(424242, "orphan.txt", FileType::Readme, vec![]);

        let mut tx = store.begin_transaction().await.unwrap();
        let err = tx.persist_resource(&res).await.unwrap_err();
        assert!(matches!(err, AppError::Database(msg) if msg.contains("Foreign key")));
    }

    #[tokio::test]
    async fn test_version_round_trip() {
        let (store, version_id) = setup().await;

        let mut version = store
            .find_extension_version(version_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!version.active);

        version.active = true;
        let mut tx = store.begin_transaction().await.unwrap();
        tx.merge_version(&version).await.unwrap();
        let versions = tx.find_versions(version.extension_id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(versions.len(), 1);
        assert!(versions[0].active);
    }
}
