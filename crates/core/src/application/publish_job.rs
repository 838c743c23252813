// Publish Job Service - persistence and storage placement steps of publishing

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{ExtensionVersion, FileResource, ResourceId, StorageType};
use crate::error::{AppError, Result};
use crate::port::{
    EntityStore, EntityTransaction, ExtensionUpdater, StorageUtil, TransactionalEntityStore,
};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Publish Job Service
///
/// Stateless façade used by the publishing workflow. Every method is an
/// independent unit of work: transactional methods open, commit or roll back
/// their own transaction, and the two placement methods run under the retry
/// policy.
pub struct PublishJobService {
    entities: Arc<dyn EntityStore>,
    tx_entities: Arc<dyn TransactionalEntityStore>,
    storage: Arc<dyn StorageUtil>,
    extensions: Arc<dyn ExtensionUpdater>,
    retry_policy: RetryPolicy,
}

impl PublishJobService {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        tx_entities: Arc<dyn TransactionalEntityStore>,
        storage: Arc<dyn StorageUtil>,
        extensions: Arc<dyn ExtensionUpdater>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            entities,
            tx_entities,
            storage,
            extensions,
            retry_policy,
        }
    }

    /// Point lookup; a miss is `Ok(None)`
    pub async fn get_file_resource(&self, id: ResourceId) -> Result<Option<FileResource>> {
        self.entities.find_file_resource(id).await
    }

    /// Remove every file resource of the version except downloads, atomically.
    ///
    /// Returns the number of removed resources.
    pub async fn delete_file_resources(&self, ext_version: &ExtensionVersion) -> Result<usize> {
        let version_id = ext_version
            .require_id()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let mut tx = self.tx_entities.begin_transaction().await?;

        let result = async {
            let mut removed = 0;
            for file in tx.find_files(version_id).await? {
                if file.is_download() {
                    continue;
                }
                if let Some(id) = file.id {
                    if tx.remove_resource(id).await? {
                        removed += 1;
                    }
                }
            }
            Ok::<_, AppError>(removed)
        }
        .await;

        let removed = finish(tx, result).await?;
        info!(version_id, removed, "Deleted file resources");
        Ok(removed)
    }

    /// Place a download in the database or in external storage.
    ///
    /// The content is kept in both cases.
    pub async fn store_download(&self, resource: &mut FileResource) -> Result<()> {
        self.store_with_retry(resource, false).await
    }

    /// Place a resource in the database or in external storage.
    ///
    /// When stored externally the in-memory content is cleared so it never
    /// reaches the database row.
    pub async fn store_resource(&self, resource: &mut FileResource) -> Result<()> {
        self.store_with_retry(resource, true).await
    }

    /// Insert a new resource row; the assigned ID is written back
    pub async fn persist_resource(&self, resource: &mut FileResource) -> Result<()> {
        let mut tx = self.tx_entities.begin_transaction().await?;
        let result = tx.persist_resource(resource).await;
        let id = finish(tx, result).await?;

        resource.id = Some(id);
        debug!(resource_id = id, name = %resource.name, "Persisted file resource");
        Ok(())
    }

    /// Mark the version active and refresh the derived state of its extension,
    /// in one transaction.
    pub async fn activate_extension(&self, ext_version: &mut ExtensionVersion) -> Result<()> {
        ext_version.active = true;

        let mut tx = self.tx_entities.begin_transaction().await?;
        let result = async {
            let id = tx.merge_version(ext_version).await?;
            self.extensions
                .update_extension(tx.as_mut(), ext_version.extension_id)
                .await?;
            Ok::<_, AppError>(id)
        }
        .await;

        let id = finish(tx, result).await?;
        ext_version.id = Some(id);
        info!(
            version_id = id,
            extension_id = ext_version.extension_id,
            version = %ext_version.version,
            "Extension version activated"
        );
        Ok(())
    }

    /// Merge an updated resource (insert if it has no row yet)
    pub async fn update_resource(&self, resource: &mut FileResource) -> Result<()> {
        let mut tx = self.tx_entities.begin_transaction().await?;
        let result = tx.merge_resource(resource).await;
        let id = finish(tx, result).await?;

        resource.id = Some(id);
        debug!(resource_id = id, "Merged file resource");
        Ok(())
    }

    async fn store_with_retry(
        &self,
        resource: &mut FileResource,
        clear_content: bool,
    ) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.place(resource, clear_content).await {
                Ok(()) => return Ok(()),
                Err(e) => match self.retry_policy.should_retry(attempt, &e) {
                    RetryDecision::Retry(delay) => {
                        sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::Failed => {
                        warn!(
                            name = %resource.name,
                            file_type = %resource.file_type,
                            attempt,
                            error = %e,
                            "Storing file resource failed"
                        );
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn place(&self, resource: &mut FileResource, clear_content: bool) -> Result<()> {
        if self.storage.should_store_externally(resource) {
            self.storage.upload_file(resource).await?;
            if clear_content {
                resource.content = None;
            }
        } else {
            resource.storage_type = Some(StorageType::Database);
        }

        debug!(
            name = %resource.name,
            file_type = %resource.file_type,
            storage_type = ?resource.storage_type,
            "File resource placed"
        );
        Ok(())
    }
}

/// Commit on success, roll back on failure; the original error is returned
/// even if the rollback itself fails.
async fn finish<T>(tx: Box<dyn EntityTransaction>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}
