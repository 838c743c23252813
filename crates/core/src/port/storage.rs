// Storage Utility Port
// Decides DB-vs-external placement and uploads to the external blob store

use crate::domain::FileResource;
use async_trait::async_trait;
use thiserror::Error;

/// External storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport-level failure; the upload may succeed if attempted again
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Resource has no content to upload: {0}")]
    MissingContent(String),

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transport(_))
    }
}

/// Storage utility trait
///
/// Implementations:
/// - LocalStorageUtil: local-filesystem blob store (infra-storage)
/// - mocks::MockStorageUtil: scripted behavior for tests
#[async_trait]
pub trait StorageUtil: Send + Sync {
    /// Whether this resource should live outside the database
    fn should_store_externally(&self, resource: &FileResource) -> bool;

    /// Upload the resource content and tag the resource with the external
    /// storage type. The content itself is left untouched.
    async fn upload_file(&self, resource: &mut FileResource) -> Result<(), StorageError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::StorageType;
    use std::sync::Mutex;

    /// Mock upload behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Fail the first N uploads with a transport error, then succeed
        TransientFailures(u32),
        /// Always fail with a permanent error
        Reject(String),
    }

    /// Mock Storage Utility for testing
    pub struct MockStorageUtil {
        external: bool,
        behavior: Mutex<MockBehavior>,
        upload_count: Mutex<usize>,
    }

    impl MockStorageUtil {
        pub fn new(external: bool, behavior: MockBehavior) -> Self {
            Self {
                external,
                behavior: Mutex::new(behavior),
                upload_count: Mutex::new(0),
            }
        }

        /// Everything goes to external storage, uploads succeed
        pub fn new_external() -> Self {
            Self::new(true, MockBehavior::Success)
        }

        /// Everything stays in the database
        pub fn new_database_only() -> Self {
            Self::new(false, MockBehavior::Success)
        }

        pub fn new_flaky(failures: u32) -> Self {
            Self::new(true, MockBehavior::TransientFailures(failures))
        }

        pub fn new_rejecting(message: impl Into<String>) -> Self {
            Self::new(true, MockBehavior::Reject(message.into()))
        }

        pub fn upload_count(&self) -> usize {
            *self.upload_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl StorageUtil for MockStorageUtil {
        fn should_store_externally(&self, _resource: &FileResource) -> bool {
            self.external
        }

        async fn upload_file(&self, resource: &mut FileResource) -> Result<(), StorageError> {
            *self.upload_count.lock().unwrap() += 1;

            let mut behavior = self.behavior.lock().unwrap();
            match &mut *behavior {
                MockBehavior::Success => {}
                MockBehavior::TransientFailures(0) => {}
                MockBehavior::TransientFailures(remaining) => {
                    *remaining -= 1;
                    return Err(StorageError::Transport("mock connection reset".to_string()));
                }
                MockBehavior::Reject(msg) => return Err(StorageError::Rejected(msg.clone())),
            }

            resource.storage_type = Some(StorageType::Local);
            Ok(())
        }
    }
}
