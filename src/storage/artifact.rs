// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Artifact records: a persisted generated image and its provenance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Provenance stored with every artifact. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_prompt: Option<String>,
    /// Admitted size (after privilege clamping), not the provider-mapped one
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_mask: bool,
    pub provider: String,
}

/// Public artifact summary: `{id, url, metadata}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub url: String,
    pub metadata: ArtifactMetadata,
}

/// Input to `ArtifactStore::put`
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub metadata: ArtifactMetadata,
}

/// A stored artifact with its bytes
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub artifact: Artifact,
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Hex SHA-256 of `bytes`
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Hex SHA-256 digest
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// File extension for a stored content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}
