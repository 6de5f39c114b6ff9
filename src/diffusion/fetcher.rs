// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Downloads provider-hosted images

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("invalid image url '{0}'")]
    InvalidUrl(String),

    #[error("unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("image download returned status {0}")]
    Status(u16),

    #[error("downloaded content is not an image (content-type: {0})")]
    NotAnImage(String),

    #[error("image download failed: {0}")]
    Network(String),

    #[error("image download timed out")]
    Timeout,

    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Upper bound on a single downloaded image
pub const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// Bytes plus the declared content type
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// reqwest-backed fetcher: http(s) only, success status and `image/*` required
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Media types compare case-insensitively
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.trim_start().to_ascii_lowercase().starts_with("image/")
}

/// Append a chunk, failing once the body would pass `limit`
fn append_limited(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), FetchError> {
    if body.len() + chunk.len() > limit {
        return Err(FetchError::TooLarge { limit });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Parse and restrict to http/https
pub fn validate_image_url(raw: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let url = validate_image_url(url)?;
        debug!("Fetching generated image from {}", url.host_str().unwrap_or("?"));

        let mut response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            return Err(FetchError::NotAnImage(content_type));
        }

        let limit = self.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
        {
            append_limited(&mut bytes, &chunk, limit)?;
        }

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}
