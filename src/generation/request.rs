// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation request wire type and validation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::GenerationError;
use crate::diffusion::admission::{ImageSize, ALLOWED_SIZES};

/// Upper bound on images per request
pub const MAX_IMAGES: u32 = 4;

fn default_n() -> u32 {
    1
}

/// Body of `POST /generate` and `POST /generate/stream`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Text prompt describing the desired image
    pub prompt: String,

    /// Expanded prompt; supersedes `prompt` as moderation input when present
    #[serde(default)]
    pub expanded_prompt: Option<String>,

    /// Output size; absent or "auto" lets admission pick
    #[serde(default)]
    pub size: Option<String>,

    /// Number of images, 1..=4
    #[serde(default = "default_n", alias = "count")]
    pub n: u32,

    /// Opaque seed, forwarded to the provider unexamined
    #[serde(default)]
    pub seed: Option<Value>,

    /// Artifact id of the reference photo
    #[serde(default, alias = "baseArtifactRef")]
    pub base_image_id: Option<String>,

    /// Inline mask bitmap, base64 or a `data:` URL
    #[serde(default)]
    pub mask: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub prompt: String,
    pub expanded_prompt: Option<String>,
    pub size: Option<ImageSize>,
    pub n: u8,
    pub seed: Option<Value>,
    pub base_image_id: Option<String>,
    pub mask: Option<Vec<u8>>,
}

impl ValidatedRequest {
    /// Text handed to the moderator: the expanded prompt when present
    pub fn moderation_input(&self) -> &str {
        self.expanded_prompt.as_deref().unwrap_or(&self.prompt)
    }
}

impl GenerationRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            n: 1,
            ..Default::default()
        }
    }

    /// Fail fast on the first violation
    pub fn validate(&self) -> Result<ValidatedRequest, GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::validation(
                "prompt",
                "prompt must not be empty",
            ));
        }

        if self.n == 0 || self.n > MAX_IMAGES {
            return Err(GenerationError::validation(
                "n",
                format!("n must be between 1 and {}, got {}", MAX_IMAGES, self.n),
            ));
        }

        let size = match self.size.as_deref().map(str::trim) {
            None | Some("") | Some("auto") => None,
            Some(raw) => Some(ImageSize::parse(raw).ok_or_else(|| {
                GenerationError::validation(
                    "size",
                    format!(
                        "invalid size '{}'; allowed: {}",
                        raw,
                        ALLOWED_SIZES
                            .iter()
                            .map(ImageSize::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })?),
        };

        let base_image_id = self
            .base_image_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let mask = match self.mask.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            None => None,
            Some(raw) => {
                if base_image_id.is_none() {
                    return Err(GenerationError::validation(
                        "mask",
                        "mask requires baseImageId",
                    ));
                }
                if self.n != 1 {
                    return Err(GenerationError::validation(
                        "mask",
                        format!("mask requires n == 1, got {}", self.n),
                    ));
                }
                Some(decode_mask(raw)?)
            }
        };

        let expanded_prompt = self
            .expanded_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string);

        Ok(ValidatedRequest {
            prompt: self.prompt.trim().to_string(),
            expanded_prompt,
            size,
            n: self.n as u8,
            seed: self.seed.clone(),
            base_image_id,
            mask,
        })
    }
}

/// Accepts bare base64 or `data:<mime>;base64,<payload>`
fn decode_mask(raw: &str) -> Result<Vec<u8>, GenerationError> {
    let payload = match (raw.starts_with("data:"), raw.find("base64,")) {
        (true, Some(idx)) => &raw[idx + "base64,".len()..],
        _ => raw,
    };
    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| GenerationError::validation("mask", format!("mask is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(GenerationError::validation("mask", "mask is empty"));
    }
    Ok(bytes)
}
