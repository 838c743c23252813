// Transaction port for atomic operations

use crate::domain::{
    Extension, ExtensionId, ExtensionVersion, FileResource, ResourceId, VersionId,
};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
///
/// Implementations must roll back when dropped without `commit`.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Entity store able to open transactions
#[async_trait]
pub trait TransactionalEntityStore: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn EntityTransaction>>;
}

/// Entity operations within a transaction
#[async_trait]
pub trait EntityTransaction: Transaction {
    /// All file resources owned by an extension version
    async fn find_files(&mut self, version_id: VersionId) -> Result<Vec<FileResource>>;

    /// Insert a new resource row, returning its ID.
    ///
    /// Fails with `AppError::Conflict` if the resource already carries an ID
    /// that exists.
    async fn persist_resource(&mut self, resource: &FileResource) -> Result<ResourceId>;

    /// Insert or update a resource by ID, returning its ID
    async fn merge_resource(&mut self, resource: &FileResource) -> Result<ResourceId>;

    /// Remove a resource row (returns false if it did not exist)
    async fn remove_resource(&mut self, id: ResourceId) -> Result<bool>;

    /// Find extension by ID (within transaction)
    async fn find_extension(&mut self, id: ExtensionId) -> Result<Option<Extension>>;

    /// Insert or update an extension by ID, returning its ID
    async fn merge_extension(&mut self, extension: &Extension) -> Result<ExtensionId>;

    /// All versions of an extension
    async fn find_versions(&mut self, extension_id: ExtensionId) -> Result<Vec<ExtensionVersion>>;

    /// Insert or update a version by ID, returning its ID
    async fn merge_version(&mut self, version: &ExtensionVersion) -> Result<VersionId>;
}
