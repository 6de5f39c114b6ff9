// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation response types

use serde::{Deserialize, Serialize};

use crate::generation::GenerationOutcome;
use crate::storage::Artifact;

/// Response from `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    /// Persisted images, in provider order
    pub images: Vec<Artifact>,
    pub generated_count: usize,
    /// Records returned by the provider
    pub total_count: usize,
    /// Size actually honoured after admission
    pub size: String,
    pub request_id: String,
}

impl From<GenerationOutcome> for GenerateImageResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            generated_count: outcome.artifacts.len(),
            total_count: outcome.total_count,
            size: outcome.effective_size.as_str().to_string(),
            request_id: outcome.request_id,
            images: outcome.artifacts,
        }
    }
}
