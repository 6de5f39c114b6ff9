// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Artifact store seam and the in-memory implementation

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::artifact::{content_digest, Artifact, NewArtifact, StoredArtifact};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid artifact id: {0}")]
    InvalidId(String),
    #[error("Quota exceeded")]
    QuotaExceeded,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist bytes + metadata and return the immutable artifact record
    async fn put(&self, artifact: NewArtifact) -> Result<Artifact, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<StoredArtifact>, StorageError>;
}

/// Ids are generated here, but `get` receives them from the outside world
pub fn validate_artifact_id(id: &str) -> Result<(), StorageError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

/// Build the stored record for a freshly generated id
pub(crate) fn new_stored(artifact: NewArtifact, base_url: &str) -> StoredArtifact {
    let id = Uuid::new_v4().to_string();
    let sha256 = content_digest(&artifact.bytes);
    StoredArtifact {
        artifact: Artifact {
            url: format!("{}/{}", base_url.trim_end_matches('/'), id),
            id,
            metadata: artifact.metadata,
        },
        bytes: artifact.bytes,
        content_type: artifact.content_type,
        sha256,
        created_at: Utc::now(),
    }
}

/// Process-local store; the default when no artifact directory is configured
#[derive(Clone)]
pub struct InMemoryArtifactStore {
    base_url: String,
    artifacts: Arc<RwLock<HashMap<String, StoredArtifact>>>,
    injected_errors: Arc<Mutex<Vec<StorageError>>>,
}

impl InMemoryArtifactStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            injected_errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the next `put` fail with `error` (queued, first in first out)
    pub async fn inject_error(&self, error: StorageError) {
        self.injected_errors.lock().await.push(error);
    }

    /// Insert a record directly, e.g. an uploaded base image
    pub async fn insert(&self, stored: StoredArtifact) {
        self.artifacts
            .write()
            .await
            .insert(stored.artifact.id.clone(), stored);
    }

    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new("/artifacts")
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, artifact: NewArtifact) -> Result<Artifact, StorageError> {
        {
            let mut injected = self.injected_errors.lock().await;
            if !injected.is_empty() {
                return Err(injected.remove(0));
            }
        }

        let stored = new_stored(artifact, &self.base_url);
        let record = stored.artifact.clone();
        self.artifacts.write().await.insert(record.id.clone(), stored);
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredArtifact>, StorageError> {
        validate_artifact_id(id)?;
        Ok(self.artifacts.read().await.get(id).cloned())
    }
}
