//! Reopening a store from disk.

use super::{faq, index_dir, open_store, TestProvider};
use crate::store::LifecycleState;
use crate::vector_index::VectorIndex;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_reopen_populated_store() {
    let temp = TempDir::new().unwrap();
    let before = {
        let store = open_store(temp.path(), TestProvider::new(384)).await;
        store
            .ingest(vec![
                faq("Our support line is open from 8am to 6pm.", "Support hours"),
                faq("Orders ship from our warehouse in Lisbon.", "Shipping origin"),
            ])
            .await
            .unwrap();
        store.retrieve_scored("support hours", 3).await.unwrap()
    };

    let store = open_store(temp.path(), TestProvider::new(384)).await;
    assert_eq!(store.lifecycle().await, LifecycleState::Loaded);
    assert_eq!(store.stats().await.total_documents, 2);
    assert_eq!(store.retrieve_scored("support hours", 3).await.unwrap(), before);

    let report = store
        .ingest(vec![faq("Returns are free within thirty days.", "Returns")])
        .await
        .unwrap();
    assert!(!report.replaced_placeholder);
    assert_eq!(store.stats().await.total_documents, 3);
}

#[tokio::test]
async fn test_reopen_bootstrapped_store_still_replaces_placeholder() {
    let temp = TempDir::new().unwrap();
    drop(open_store(temp.path(), TestProvider::new(384)).await);

    let store = open_store(temp.path(), TestProvider::new(384)).await;
    assert_eq!(store.lifecycle().await, LifecycleState::Bootstrapped);

    let report = store
        .ingest(vec![faq("Loyalty points expire after one year.", "Loyalty")])
        .await
        .unwrap();
    assert!(report.replaced_placeholder);
    assert_eq!(store.stats().await.total_documents, 1);
}

#[tokio::test]
async fn test_corrupt_base_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    {
        let store = open_store(temp.path(), TestProvider::new(384)).await;
        store
            .ingest(vec![faq("We accept card and bank transfer.", "Payments")])
            .await
            .unwrap();
    }

    let dir = index_dir(temp.path());
    let chunks_file = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().map_or(false, |ext| ext == "json") && !p.ends_with("manifest.json"))
        .unwrap();
    fs::write(&chunks_file, b"{ not json").unwrap();

    let store = open_store(temp.path(), TestProvider::new(384)).await;
    assert_eq!(store.lifecycle().await, LifecycleState::Bootstrapped);
    assert_eq!(store.stats().await.total_documents, 1);
    assert!(VectorIndex::load(&dir).is_ok());
}

#[tokio::test]
async fn test_dimension_change_rebuilds() {
    let temp = TempDir::new().unwrap();
    {
        let store = open_store(temp.path(), TestProvider::new(384)).await;
        store
            .ingest(vec![faq("Premium members get free express delivery.", "Premium")])
            .await
            .unwrap();
    }

    let store = open_store(temp.path(), TestProvider::new(128)).await;
    assert_eq!(store.lifecycle().await, LifecycleState::Bootstrapped);
    assert_eq!(store.stats().await.dimension, Some(128));
    assert_eq!(VectorIndex::load(&index_dir(temp.path())).unwrap().dimension(), 128);
}

#[tokio::test]
async fn test_manifest_with_absurd_count_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    {
        let store = open_store(temp.path(), TestProvider::new(384)).await;
        store
            .ingest(vec![faq("Gift cards never expire.", "Gift cards")])
            .await
            .unwrap();
    }

    let manifest_path = index_dir(temp.path()).join("manifest.json");
    let mut manifest: serde_json::Value =
        serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();
    manifest["count"] = serde_json::json!(u64::MAX / 4);
    fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    let store = open_store(temp.path(), TestProvider::new(384)).await;
    assert_eq!(store.lifecycle().await, LifecycleState::Bootstrapped);
    assert_eq!(store.stats().await.total_documents, 1);
}
