// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::ApiError;
use super::http_server::AppState;
use crate::generation::PromptPreview;
use crate::storage::StorageError;
use crate::templates::{resolve, Resolution, TemplateContext};
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build: String,
    pub features: Vec<String>,
    pub provider_configured: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveTemplateRequest {
    pub template: String,
    #[serde(default)]
    pub context: TemplateContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckPromptRequest {
    pub prompt: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        build: version::VERSION.to_string(),
        features: version::FEATURES.iter().map(|f| f.to_string()).collect(),
        provider_configured: state.orchestrator.is_provider_configured(),
    })
}

/// POST /templates/resolve
///
/// Resolution errors are part of the 200 body; they never fail the request.
pub async fn resolve_template_handler(
    body: Result<Json<ResolveTemplateRequest>, JsonRejection>,
) -> Result<Json<Resolution>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let resolution = resolve(&request.template, &request.context);
    if !resolution.is_clean() {
        debug!("Template resolved with {} error(s)", resolution.errors.len());
    }
    Ok(Json(resolution))
}

/// POST /prompts/check - moderation and sanitization preview, no provider call
pub async fn check_prompt_handler(
    State(state): State<AppState>,
    body: Result<Json<CheckPromptRequest>, JsonRejection>,
) -> Result<Json<PromptPreview>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "prompt".to_string(),
            message: "prompt must not be empty".to_string(),
        });
    }
    Ok(Json(state.orchestrator.preview(&request.prompt)))
}

/// GET /artifacts/:id - stored bytes, ETag is the content digest
pub async fn get_artifact_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let stored = match state.orchestrator.store().get(&id).await {
        Ok(Some(stored)) => stored,
        Ok(None) | Err(StorageError::InvalidId(_)) => {
            return Err(ApiError::NotFound(format!("Artifact '{}' not found", id)))
        }
        Err(e) => {
            warn!("Failed to load artifact {}: {}", id, e);
            return Err(ApiError::InternalError("Failed to load artifact".to_string()));
        }
    };

    let etag = format!("\"{}\"", stored.sha256);
    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let content_type = HeaderValue::from_str(&stored.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::ETAG,
                HeaderValue::from_str(&etag)
                    .map_err(|e| ApiError::InternalError(e.to_string()))?,
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            ),
        ],
        stored.bytes,
    )
        .into_response())
}
