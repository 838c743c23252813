// Port Layer - Interfaces for external dependencies

pub mod entity_store;
pub mod extension_updater;
pub mod storage;
pub mod transaction;

// Re-exports
pub use entity_store::EntityStore;
pub use extension_updater::ExtensionUpdater;
pub use storage::{StorageError, StorageUtil};
pub use transaction::{EntityTransaction, Transaction, TransactionalEntityStore};
