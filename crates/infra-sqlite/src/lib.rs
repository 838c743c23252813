// Marketplace Infrastructure - SQLite Adapter
// Implements: EntityStore, TransactionalEntityStore

mod connection;
mod entity_store;
mod migration;
mod queries;
mod transaction;

pub use connection::create_pool;
pub use entity_store::SqliteEntityStore;
pub use migration::run_migrations;
pub use transaction::SqliteEntityTransaction;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
