// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Turns one provider record into verified image bytes

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use thiserror::Error;

use crate::diffusion::fetcher::{FetchError, ImageFetcher};
use crate::diffusion::provider::ProviderImage;

/// Per-image failure. Never fatal on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterializeError {
    #[error("provider record has neither url nor inline data")]
    MissingPayload,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("inline image is not valid base64: {0}")]
    Decode(String),

    #[error("bytes are not a recognised image format")]
    UnrecognizedFormat,

    #[error("image retrieval timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[derive(Debug, Clone)]
pub struct MaterializedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Fetch a URL record or decode an inline record, then sniff the format
pub async fn materialize(
    image: &ProviderImage,
    fetcher: &dyn ImageFetcher,
) -> Result<MaterializedImage, MaterializeError> {
    let bytes = match image {
        ProviderImage::Url { url } => fetcher.fetch(url).await?.bytes,
        ProviderImage::Inline { b64_json } => decode_inline(b64_json)?,
    };
    let content_type = sniff_content_type(&bytes)?;
    Ok(MaterializedImage {
        bytes,
        content_type: content_type.to_string(),
    })
}

/// Decode base64, tolerating a `data:` URL prefix
pub fn decode_inline(b64_json: &str) -> Result<Vec<u8>, MaterializeError> {
    let payload = b64_json
        .split_once("base64,")
        .filter(|_| b64_json.starts_with("data:"))
        .map(|(_, rest)| rest)
        .unwrap_or(b64_json)
        .trim();
    BASE64
        .decode(payload.as_bytes())
        .map_err(|e| MaterializeError::Decode(e.to_string()))
}

/// Content type from magic bytes; the declared header is not trusted
pub fn sniff_content_type(bytes: &[u8]) -> Result<&'static str, MaterializeError> {
    let format = image::guess_format(bytes).map_err(|_| MaterializeError::UnrecognizedFormat)?;
    Ok(match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    })
}
