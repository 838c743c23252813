//! Shared fixtures: an in-memory database seeded with one extension and one
//! inactive version.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use marketplace_core::application::{PublishJobService, RetryConfig, RetryPolicy};
use marketplace_core::domain::{
    Extension, ExtensionId, ExtensionVersion, FileResource, VersionId,
};
use marketplace_core::port::{ExtensionUpdater, StorageUtil, TransactionalEntityStore};
use marketplace_infra_sqlite::{create_pool, run_migrations, SqliteEntityStore};
use std::sync::Arc;

pub struct Fixture {
    pub store: Arc<SqliteEntityStore>,
    pub extension_id: ExtensionId,
    pub version_id: VersionId,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = create_pool(":memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Arc::new(SqliteEntityStore::new(pool));

        let mut tx = store.begin_transaction().await.unwrap();
        let extension_id = tx
            .merge_extension(&Extension::new("redhat", "vscode-yaml"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut fixture = Self {
            store,
            extension_id,
            version_id: 0,
        };
        fixture.version_id = fixture.add_version("1.0.0", false, 0).await;
        fixture
    }

    /// Insert a version published `minutes` after a fixed epoch
    pub async fn add_version(&self, version: &str, active: bool, minutes: i64) -> VersionId {
        let mut v = ExtensionVersion::new(self.extension_id, version, at(minutes));
        v.active = active;

        let mut tx = self.store.begin_transaction().await.unwrap();
        let id = tx.merge_version(&v).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    /// Persist a resource directly, bypassing the service
    pub async fn seed_resource(&self, resource: FileResource) -> FileResource {
        let mut resource = resource;
        let mut tx = self.store.begin_transaction().await.unwrap();
        resource.id = Some(tx.persist_resource(&resource).await.unwrap());
        tx.commit().await.unwrap();
        resource
    }

    pub async fn files(&self, version_id: VersionId) -> Vec<FileResource> {
        let mut tx = self.store.begin_transaction().await.unwrap();
        tx.find_files(version_id).await.unwrap()
    }

    pub fn service(
        &self,
        storage: Arc<dyn StorageUtil>,
        extensions: Arc<dyn ExtensionUpdater>,
        max_attempts: u32,
    ) -> PublishJobService {
        PublishJobService::new(
            self.store.clone(),
            self.store.clone(),
            storage,
            extensions,
            fast_retry(max_attempts),
        )
    }
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Retry policy with millisecond delays
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(RetryConfig {
        max_attempts,
        initial_delay_ms: 1,
        max_delay_ms: 1,
        ..RetryConfig::default()
    })
    .unwrap()
}
