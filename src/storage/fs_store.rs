// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Filesystem artifact store: `<dir>/<id>.<ext>` plus a `<id>.json` record

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::artifact::{extension_for, Artifact, NewArtifact, StoredArtifact};
use super::artifact_store::{new_stored, validate_artifact_id, ArtifactStore, StorageError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactRecord {
    artifact: Artifact,
    content_type: String,
    sha256: String,
    created_at: DateTime<Utc>,
    file_name: String,
}

pub struct FsArtifactStore {
    dir: PathBuf,
    base_url: String,
}

impl FsArtifactStore {
    /// Creates `dir` if missing
    pub async fn new(dir: impl AsRef<Path>, base_url: &str) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            base_url: base_url.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

/// Write the image, then its record. The image is removed again if the
/// record cannot be written, so no file is left without a record.
async fn write_pair(
    image_path: &Path,
    bytes: &[u8],
    record_path: &Path,
    record: &[u8],
) -> Result<(), StorageError> {
    tokio::fs::write(image_path, bytes).await?;
    if let Err(e) = tokio::fs::write(record_path, record).await {
        if let Err(cleanup) = tokio::fs::remove_file(image_path).await {
            warn!(
                "Failed to remove orphaned image {}: {}",
                image_path.display(),
                cleanup
            );
        }
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, artifact: NewArtifact) -> Result<Artifact, StorageError> {
        let stored = new_stored(artifact, &self.base_url);
        let id = stored.artifact.id.clone();
        let file_name = format!("{}.{}", id, extension_for(&stored.content_type));

        let image_path = self.dir.join(&file_name);
        let record = ArtifactRecord {
            artifact: stored.artifact.clone(),
            content_type: stored.content_type,
            sha256: stored.sha256,
            created_at: stored.created_at,
            file_name,
        };
        let encoded = serde_json::to_vec_pretty(&record)?;
        write_pair(&image_path, &stored.bytes, &self.record_path(&id), &encoded).await?;

        debug!(artifact_id = %id, "Artifact written to {}", self.dir.display());
        Ok(record.artifact)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredArtifact>, StorageError> {
        validate_artifact_id(id)?;

        let raw = match tokio::fs::read(self.record_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: ArtifactRecord = serde_json::from_slice(&raw)?;
        let bytes = tokio::fs::read(self.dir.join(&record.file_name)).await?;

        Ok(Some(StoredArtifact {
            artifact: record.artifact,
            bytes,
            content_type: record.content_type,
            sha256: record.sha256,
            created_at: record.created_at,
        }))
    }
}
