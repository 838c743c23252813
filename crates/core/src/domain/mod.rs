// Domain Layer - Pure business logic and entities

pub mod error;
pub mod extension;
pub mod file_resource;

// Re-exports
pub use error::DomainError;
pub use extension::{Extension, ExtensionId, ExtensionState, ExtensionVersion, VersionId};
pub use file_resource::{FileResource, FileType, ResourceId, StorageType};
