// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the filesystem artifact store

use fabstir_image_gen::storage::{
    content_digest, ArtifactMetadata, ArtifactStore, FsArtifactStore, NewArtifact, StorageError,
};
use tempfile::TempDir;

fn new_artifact(bytes: &[u8], content_type: &str) -> NewArtifact {
    NewArtifact {
        bytes: bytes.to_vec(),
        content_type: content_type.to_string(),
        metadata: ArtifactMetadata {
            prompt: "a lighthouse at dusk".to_string(),
            expanded_prompt: Some("a lighthouse at dusk, oil painting".to_string()),
            size: "1024x1024".to_string(),
            seed: Some(serde_json::json!(42)),
            base_image_id: None,
            has_mask: false,
            provider: "fake".to_string(),
        },
    }
}

#[tokio::test]
async fn test_put_writes_image_and_record() {
    let dir = TempDir::new().unwrap();
    let store = FsArtifactStore::new(dir.path(), "https://img.test/artifacts")
        .await
        .unwrap();

    let artifact = store
        .put(new_artifact(b"png-bytes", "image/png"))
        .await
        .unwrap();
    assert_eq!(
        artifact.url,
        format!("https://img.test/artifacts/{}", artifact.id)
    );
    assert!(dir.path().join(format!("{}.png", artifact.id)).exists());
    assert!(dir.path().join(format!("{}.json", artifact.id)).exists());
}

#[tokio::test]
async fn test_get_returns_bytes_and_metadata() {
    let dir = TempDir::new().unwrap();
    let store = FsArtifactStore::new(dir.path(), "/artifacts").await.unwrap();
    let artifact = store
        .put(new_artifact(b"jpeg-bytes", "image/jpeg"))
        .await
        .unwrap();

    let stored = store.get(&artifact.id).await.unwrap().unwrap();
    assert_eq!(stored.bytes, b"jpeg-bytes");
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(stored.sha256, content_digest(b"jpeg-bytes"));
    assert_eq!(stored.artifact, artifact);
    assert_eq!(stored.artifact.metadata.seed, Some(serde_json::json!(42)));
}

#[tokio::test]
async fn test_records_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = FsArtifactStore::new(dir.path(), "/artifacts").await.unwrap();
        store
            .put(new_artifact(b"webp", "image/webp"))
            .await
            .unwrap()
            .id
    };

    let reopened = FsArtifactStore::new(dir.path(), "/artifacts").await.unwrap();
    let stored = reopened.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.bytes, b"webp");
}

#[tokio::test]
async fn test_missing_and_invalid_ids() {
    let dir = TempDir::new().unwrap();
    let store = FsArtifactStore::new(dir.path(), "/artifacts").await.unwrap();

    assert!(store.get("does-not-exist").await.unwrap().is_none());
    assert!(matches!(
        store.get("../../etc/passwd").await,
        Err(StorageError::InvalidId(_))
    ));
    assert!(matches!(store.get("").await, Err(StorageError::InvalidId(_))));
}

#[tokio::test]
async fn test_new_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FsArtifactStore::new(&nested, "/artifacts").await.unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.dir(), nested.as_path());
}

#[tokio::test]
async fn test_unknown_content_type_uses_bin_extension() {
    let dir = TempDir::new().unwrap();
    let store = FsArtifactStore::new(dir.path(), "/artifacts").await.unwrap();
    let artifact = store
        .put(new_artifact(b"raw", "application/octet-stream"))
        .await
        .unwrap();
    assert!(dir.path().join(format!("{}.bin", artifact.id)).exists());
}
