// Extension Updater Port

use crate::domain::ExtensionId;
use crate::error::Result;
use crate::port::EntityTransaction;
use async_trait::async_trait;

/// Recomputes derived extension state after one of its versions changed.
///
/// Runs inside the caller's transaction so a failed update rolls back the
/// change that triggered it.
#[async_trait]
pub trait ExtensionUpdater: Send + Sync {
    async fn update_extension(
        &self,
        tx: &mut dyn EntityTransaction,
        extension_id: ExtensionId,
    ) -> Result<()>;
}
