// Entity Store Port (Interface) - non-transactional point lookups

use crate::domain::{Extension, ExtensionId, ExtensionVersion, FileResource, ResourceId, VersionId};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to persisted entities outside of any transaction.
///
/// A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Find file resource by ID
    async fn find_file_resource(&self, id: ResourceId) -> Result<Option<FileResource>>;

    /// Find extension version by ID
    async fn find_extension_version(&self, id: VersionId) -> Result<Option<ExtensionVersion>>;

    /// Find extension by ID
    async fn find_extension(&self, id: ExtensionId) -> Result<Option<Extension>>;
}
