// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible image generation client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::diffusion::provider::{ImageProvider, ProviderError, ProviderImage, ProviderRequest};

/// Tag recorded on artifacts produced through this client
pub const PROVIDER_TAG: &str = "openai-compatible";

/// Accepted values for `response_format`
pub const RESPONSE_FORMATS: &[&str] = &["url", "b64_json"];

/// Client for an OpenAI-compatible `/v1/images/generations` endpoint
pub struct DiffusionClient {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: String,
    response_format: String,
    timeout: Duration,
}

// --- OpenAI-compatible response types ---

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    #[serde(default)]
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

impl OpenAIImageResponse {
    /// Resolve every record into the two-variant provider union
    pub fn into_images(self) -> Vec<Option<ProviderImage>> {
        self.data
            .into_iter()
            .map(|record| ProviderImage::from_record(record.url, record.b64_json))
            .collect()
    }
}

impl DiffusionClient {
    pub fn new(
        endpoint: &str,
        model_name: &str,
        api_key: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Image provider configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            api_key: api_key.to_string(),
            response_format: "url".to_string(),
            timeout,
        })
    }

    /// `url` (default) or `b64_json`; anything else is rejected
    pub fn with_response_format(mut self, response_format: &str) -> anyhow::Result<Self> {
        if !RESPONSE_FORMATS.contains(&response_format) {
            anyhow::bail!(
                "invalid response format '{}'; allowed: {}",
                response_format,
                RESPONSE_FORMATS.join(", ")
            );
        }
        self.response_format = response_format.to_string();
        Ok(self)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn response_format(&self) -> &str {
        &self.response_format
    }

    /// Check whether the provider answers its model listing
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/v1/models", self.endpoint))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Image provider health check failed: {}", e);
                false
            }
        }
    }

    /// JSON body for one generation call
    pub fn request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "prompt": request.prompt,
            "model": self.model_name,
            "size": request.size.as_str(),
            "n": request.n,
            "response_format": self.response_format,
        });
        if let Some(ref seed) = request.seed {
            body["seed"] = seed.clone();
        }
        if let Some(ref reference) = request.reference {
            body["image"] = serde_json::json!(BASE64.encode(&reference.image));
            if let Some(ref mask) = reference.mask {
                body["mask"] = serde_json::json!(BASE64.encode(mask));
            }
        }
        body
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Map a non-success provider status to the error taxonomy
pub fn classify_status(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(body),
        _ => ProviderError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl ImageProvider for DiffusionClient {
    fn name(&self) -> &str {
        PROVIDER_TAG
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> Result<Vec<Option<ProviderImage>>, ProviderError> {
        let url = format!("{}/v1/images/generations", self.endpoint);
        debug!(
            "Image provider POST {} (n={}, size={})",
            url,
            request.n,
            request.size.as_str()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        let api_response: OpenAIImageResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(api_response.into_images())
    }
}
