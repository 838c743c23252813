// Extension State Service - recomputes derived extension state

use crate::domain::{ExtensionId, ExtensionState};
use crate::error::{AppError, Result};
use crate::port::{EntityTransaction, ExtensionUpdater};
use async_trait::async_trait;
use tracing::{debug, info};

/// Default `ExtensionUpdater`: derives the aggregate state of an extension
/// from its versions and merges it within the caller's transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionStateService;

impl ExtensionStateService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtensionUpdater for ExtensionStateService {
    async fn update_extension(
        &self,
        tx: &mut dyn EntityTransaction,
        extension_id: ExtensionId,
    ) -> Result<()> {
        let mut extension = tx
            .find_extension(extension_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Extension {} not found", extension_id)))?;

        let versions = tx.find_versions(extension_id).await?;
        debug!(
            extension = %extension.full_name(),
            versions = versions.len(),
            "Recomputing extension state"
        );

        let state = ExtensionState::compute(&versions);
        extension.apply(state);
        tx.merge_extension(&extension).await?;

        info!(
            extension = %extension.full_name(),
            active = extension.active,
            latest_version_id = ?extension.latest_version_id,
            latest_prerelease_id = ?extension.latest_prerelease_id,
            "Extension state updated"
        );

        Ok(())
    }
}
