// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image provider seam
//!
//! The provider is an opaque black box: prompt + size + count in, N image
//! records or an error out. It is injected into the orchestrator so tests and
//! multiple credentials can coexist.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::diffusion::admission::ProviderSize;

/// Reference image for edit-style generation
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub image: Vec<u8>,
    pub mask: Option<Vec<u8>>,
}

/// One provider call
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub prompt: String,
    pub size: ProviderSize,
    pub n: u8,
    /// Opaque, passed through unexamined
    pub seed: Option<Value>,
    pub reference: Option<ReferenceImage>,
}

/// One returned image record, resolved once at the provider boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderImage {
    Url { url: String },
    Inline { b64_json: String },
}

impl ProviderImage {
    /// URL wins when a record carries both; `None` when it carries neither
    pub fn from_record(url: Option<String>, b64_json: Option<String>) -> Option<ProviderImage> {
        let non_empty = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        match (url.and_then(non_empty), b64_json.and_then(non_empty)) {
            (Some(url), _) => Some(ProviderImage::Url { url }),
            (None, Some(b64_json)) => Some(ProviderImage::Inline { b64_json }),
            (None, None) => None,
        }
    }
}

/// Provider failures. All of them are terminal for a generation request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("provider returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider unreachable: {0}")]
    Network(String),

    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Unauthorized(_) => "PROVIDER_UNAUTHORIZED",
            ProviderError::RateLimited(_) => "PROVIDER_RATE_LIMITED",
            ProviderError::Http { .. } => "PROVIDER_HTTP_ERROR",
            ProviderError::Network(_) => "PROVIDER_NETWORK_ERROR",
            ProviderError::Timeout { .. } => "PROVIDER_TIMEOUT",
            ProviderError::InvalidResponse(_) => "PROVIDER_INVALID_RESPONSE",
        }
    }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Tag recorded in artifact metadata
    fn name(&self) -> &str;

    /// Request `request.n` images in a single call. One slot per returned
    /// record; `None` marks a record that carried neither a URL nor inline data.
    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> Result<Vec<Option<ProviderImage>>, ProviderError>;
}
