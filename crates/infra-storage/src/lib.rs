// Marketplace Infrastructure - External Storage Adapters
// Implements: StorageUtil

mod local;

pub use local::{LocalStorageConfig, LocalStorageUtil};
