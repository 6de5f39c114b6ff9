// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod artifact;
pub mod artifact_store;
pub mod fs_store;

pub use artifact::{
    content_digest, Artifact, ArtifactMetadata, NewArtifact, StoredArtifact,
};
pub use artifact_store::{ArtifactStore, InMemoryArtifactStore, StorageError};
pub use fs_store::FsArtifactStore;
