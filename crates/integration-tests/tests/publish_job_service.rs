//! Publish job service against the SQLite entity store and a scripted
//! storage backend.

mod common;

use common::Fixture;
use marketplace_core::application::ExtensionStateService;
use marketplace_core::domain::{ExtensionVersion, FileResource, FileType, StorageType};
use marketplace_core::port::storage::mocks::MockStorageUtil;
use marketplace_core::port::EntityStore;
use marketplace_core::AppError;
use std::sync::Arc;

fn service_with(fx: &Fixture, storage: Arc<MockStorageUtil>) -> marketplace_core::application::PublishJobService {
    fx.service(storage, Arc::new(ExtensionStateService::new()), 3)
}

#[tokio::test]
async fn test_delete_file_resources_keeps_downloads() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    let download = fx
        .seed_resource(FileResource::new(fx.version_id, "yaml.vsix", FileType::Download, vec![1]))
        .await;
    for (name, t) in [
        ("README.md", FileType::Readme),
        ("icon.png", FileType::Icon),
        ("yaml.vsix.sha256", FileType::DownloadSha256),
    ] {
        fx.seed_resource(FileResource::new(fx.version_id, name, t, vec![2]))
            .await;
    }

    let version = fx
        .store
        .find_extension_version(fx.version_id)
        .await
        .unwrap()
        .unwrap();
    let removed = service.delete_file_resources(&version).await.unwrap();

    assert_eq!(removed, 3);
    let remaining = fx.files(fx.version_id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, download.id);
    assert_eq!(remaining[0].file_type, FileType::Download);
}

#[tokio::test]
async fn test_delete_file_resources_leaves_other_versions_alone() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));
    let other = fx.add_version("1.1.0", false, 10).await;

    fx.seed_resource(FileResource::new(fx.version_id, "README.md", FileType::Readme, vec![1]))
        .await;
    fx.seed_resource(FileResource::new(other, "README.md", FileType::Readme, vec![1]))
        .await;

    let version = fx.store.find_extension_version(fx.version_id).await.unwrap().unwrap();
    assert_eq!(service.delete_file_resources(&version).await.unwrap(), 1);
    // nothing left to delete
    assert_eq!(service.delete_file_resources(&version).await.unwrap(), 0);

    assert_eq!(fx.files(other).await.len(), 1);
}

#[tokio::test]
async fn test_delete_file_resources_requires_saved_version() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    let unsaved = ExtensionVersion::new(fx.extension_id, "2.0.0", common::at(0));
    let err = service.delete_file_resources(&unsaved).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_store_resource_external_clears_content() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_external());
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "CHANGELOG.md", FileType::Changelog, b"## 1.0".to_vec());
    service.store_resource(&mut res).await.unwrap();

    assert_eq!(storage.upload_count(), 1);
    assert_eq!(res.storage_type, Some(StorageType::Local));
    assert!(res.content.is_none());

    // the persisted row carries no content
    service.persist_resource(&mut res).await.unwrap();
    let found = service.get_file_resource(res.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(found.storage_type, Some(StorageType::Local));
    assert!(found.content.is_none());
}

#[tokio::test]
async fn test_store_resource_in_database_keeps_content() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_database_only());
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "package.json", FileType::Manifest, b"{}".to_vec());
    service.store_resource(&mut res).await.unwrap();

    assert_eq!(storage.upload_count(), 0);
    assert_eq!(res.storage_type, Some(StorageType::Database));
    assert_eq!(res.content.as_deref(), Some(&b"{}"[..]));
}

#[tokio::test]
async fn test_store_download_keeps_content_when_external() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_external());
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "yaml.vsix", FileType::Download, vec![0x50, 0x4b]);
    service.store_download(&mut res).await.unwrap();

    assert_eq!(storage.upload_count(), 1);
    assert_eq!(res.storage_type, Some(StorageType::Local));
    assert_eq!(res.content, Some(vec![0x50, 0x4b]));
}

#[tokio::test]
async fn test_store_download_in_database_keeps_content() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_database_only());
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "yaml.vsix", FileType::Download, vec![9]);
    service.store_download(&mut res).await.unwrap();

    assert_eq!(storage.upload_count(), 0);
    assert_eq!(res.storage_type, Some(StorageType::Database));
    assert_eq!(res.content, Some(vec![9]));
}

#[tokio::test]
async fn test_persist_assigns_id_and_rejects_duplicates() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    let mut res = FileResource::new(fx.version_id, "LICENSE", FileType::License, b"MIT".to_vec());
    service.persist_resource(&mut res).await.unwrap();
    let id = res.id.expect("id assigned");

    let err = service.persist_resource(&mut res).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert_eq!(res.id, Some(id));
    assert_eq!(fx.files(fx.version_id).await.len(), 1);
}

#[tokio::test]
async fn test_update_resource_merges_in_place() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    let mut res = FileResource::new(fx.version_id, "icon.png", FileType::Icon, vec![1]);
    service.persist_resource(&mut res).await.unwrap();
    let id = res.id.unwrap();

    res.storage_type = Some(StorageType::Database);
    res.content = Some(vec![1, 2, 3]);
    service.update_resource(&mut res).await.unwrap();
    // merging the same state again is a no-op
    service.update_resource(&mut res).await.unwrap();

    assert_eq!(res.id, Some(id));
    let files = fx.files(fx.version_id).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].storage_type, Some(StorageType::Database));
    assert_eq!(files[0].content_len(), 3);
}

#[tokio::test]
async fn test_update_resource_without_id_inserts() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    let mut res = FileResource::new(fx.version_id, "README.md", FileType::Readme, vec![1]);
    service.update_resource(&mut res).await.unwrap();

    let id = res.id.expect("id assigned");
    assert!(service.get_file_resource(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_get_missing_resource_is_none() {
    let fx = Fixture::new().await;
    let service = service_with(&fx, Arc::new(MockStorageUtil::new_database_only()));

    assert!(service.get_file_resource(404).await.unwrap().is_none());
}

#[tokio::test]
async fn test_transient_upload_failures_are_retried() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_flaky(2));
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "README.md", FileType::Readme, vec![1]);
    service.store_resource(&mut res).await.unwrap();

    assert_eq!(storage.upload_count(), 3);
    assert_eq!(res.storage_type, Some(StorageType::Local));
    assert!(res.content.is_none());
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_flaky(10));
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "yaml.vsix", FileType::Download, vec![1]);
    let err = service.store_download(&mut res).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(storage.upload_count(), 3);
    assert!(res.storage_type.is_none());
    assert!(res.content.is_some());
}

#[tokio::test]
async fn test_permanent_upload_failure_is_not_retried() {
    let fx = Fixture::new().await;
    let storage = Arc::new(MockStorageUtil::new_rejecting("quota exceeded"));
    let service = service_with(&fx, storage.clone());

    let mut res = FileResource::new(fx.version_id, "icon.png", FileType::Icon, vec![1]);
    let err = service.store_resource(&mut res).await.unwrap_err();

    assert!(matches!(err, AppError::Storage(_)), "got {:?}", err);
    assert!(!err.is_transient());
    assert_eq!(storage.upload_count(), 1);
    assert!(res.content.is_some());
}
