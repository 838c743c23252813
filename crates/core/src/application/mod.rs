// Application Layer - Use Cases and Business Logic

pub mod extension_state;
pub mod publish_job;
pub mod retry;

// Re-exports
pub use extension_state::ExtensionStateService;
pub use publish_job::PublishJobService;
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
