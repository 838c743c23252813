// Local-filesystem blob store
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use marketplace_core::domain::{FileResource, StorageType};
use marketplace_core::port::storage::{StorageError, StorageUtil};

/// Wildcard entry in `external_resource_types`
const ALL_TYPES: &str = "*";

/// `[storage]` configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    /// Root directory of the blob store; external storage is disabled when unset
    pub root: Option<PathBuf>,

    /// Resource type tags stored externally (`*` for all); downloads always are
    pub external_resource_types: Vec<String>,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            external_resource_types: vec![ALL_TYPES.to_string()],
        }
    }
}

/// Stores resource content as files below a root directory:
///
/// ```text
/// root/
/// +-- {extension_version_id}/
///     +-- {resource name}
/// ```
#[derive(Debug, Clone)]
pub struct LocalStorageUtil {
    config: LocalStorageConfig,
}

impl LocalStorageUtil {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.root.is_some()
    }

    /// Path the resource content is (or would be) stored at
    pub fn location(&self, resource: &FileResource) -> Result<PathBuf, StorageError> {
        let root = self
            .config
            .root
            .as_deref()
            .ok_or_else(|| StorageError::InvalidLocation("external storage is disabled".into()))?;
        validate_name(&resource.name)?;

        Ok(root
            .join(resource.extension_version_id.to_string())
            .join(&resource.name))
    }
}

/// A resource name must be a single path component
fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || Path::new(name).is_absolute();

    if invalid {
        Err(StorageError::InvalidLocation(format!(
            "'{}' is not a valid file name",
            name
        )))
    } else {
        Ok(())
    }
}

fn map_io_error(path: &Path, err: std::io::Error) -> StorageError {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            StorageError::Rejected(format!("{}: {}", path.display(), err))
        }
        _ => StorageError::Transport(format!("{}: {}", path.display(), err)),
    }
}

/// Remove a leftover temp file
async fn discard(tmp: &Path) {
    match fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tmp.display(), error = %e, "Failed to remove partial upload"),
    }
}

#[async_trait]
impl StorageUtil for LocalStorageUtil {
    fn should_store_externally(&self, resource: &FileResource) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if resource.is_download() {
            return true;
        }

        self.config
            .external_resource_types
            .iter()
            .any(|t| t == ALL_TYPES || t == resource.file_type.as_str())
    }

    async fn upload_file(&self, resource: &mut FileResource) -> Result<(), StorageError> {
        let content = resource
            .content
            .as_deref()
            .ok_or_else(|| StorageError::MissingContent(resource.name.clone()))?;
        let path = self.location(resource)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| map_io_error(dir, e))?;
        }

        // Write then rename so readers never observe a partial file
        let tmp = path.with_file_name(format!(".{}.upload", resource.name));
        if let Err(e) = fs::write(&tmp, content).await {
            discard(&tmp).await;
            return Err(map_io_error(&tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            discard(&tmp).await;
            if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
                return Err(StorageError::InvalidLocation(format!(
                    "{} is a directory",
                    path.display()
                )));
            }
            return Err(map_io_error(&path, e));
        }

        debug!(path = %path.display(), bytes = content.len(), "Wrote blob");
        info!(
            name = %resource.name,
            file_type = %resource.file_type,
            version_id = resource.extension_version_id,
            "Uploaded file resource to local storage"
        );

        resource.storage_type = Some(StorageType::Local);
        Ok(())
    }
}
