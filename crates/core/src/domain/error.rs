// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown file resource type: {0}")]
    UnknownFileType(String),

    #[error("Unknown storage type: {0}")]
    UnknownStorageType(String),

    #[error("{0} has not been persisted yet")]
    Unsaved(&'static str),
}
