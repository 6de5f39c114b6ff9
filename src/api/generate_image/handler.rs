// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation endpoint handlers

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::response::GenerateImageResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::streaming::{spawn_generation, to_sse_event};
use crate::config::ACCESS_CODE_HEADER;
use crate::diffusion::admission::CallerPrivilege;
use crate::generation::GenerationRequest;

/// Rate-limit key: access code, else client IP, else a shared bucket
pub fn caller_key(access_code: Option<&str>, addr: Option<SocketAddr>) -> String {
    match (access_code, addr) {
        (Some(code), _) => format!("code:{}", code),
        (None, Some(addr)) => format!("ip:{}", addr.ip()),
        (None, None) => "anonymous".to_string(),
    }
}

/// Rate limit and privilege resolution, done once per request
fn admit(
    state: &AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
) -> Result<CallerPrivilege, ApiError> {
    let access_code = headers
        .get(ACCESS_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let caller = caller_key(access_code, connect_info.map(|ConnectInfo(addr)| addr));

    state.rate_limiter.try_acquire(&caller).map_err(|retry_after| {
        warn!("Image generation rate limit exceeded for {}", caller);
        ApiError::RateLimitExceeded {
            retry_after: retry_after.as_secs().max(1),
        }
    })?;

    Ok(state.privileges.resolve(access_code))
}

fn parse_body(
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<GenerationRequest, ApiError> {
    body.map(|Json(request)| request).map_err(|e| {
        warn!("Rejected generation body: {}", e.body_text());
        ApiError::InvalidRequest(e.body_text())
    })
}

/// POST /generate - single JSON response once every image is persisted
pub async fn generate_image_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let request = parse_body(body)?;
    let privilege = admit(&state, connect_info, &headers)?;
    debug!(
        "Image generation request received: prompt_len={}, n={}, privileged={}",
        request.prompt.len(),
        request.n,
        privilege.is_privileged()
    );

    // Dropped with the handler future when the client disconnects
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let outcome = state
        .orchestrator
        .generate(request, privilege, None, cancel)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /generate/stream - progress events as server-sent events
///
/// Request-level failures (bad JSON, rate limit) are plain JSON errors; once
/// the stream is open every outcome arrives as exactly one terminal frame.
pub async fn generate_image_stream_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let request = parse_body(body)?;
    let privilege = admit(&state, connect_info, &headers)?;
    debug!(
        "Streaming image generation request received: prompt_len={}, n={}",
        request.prompt.len(),
        request.n
    );

    let events = spawn_generation(state.orchestrator.clone(), request, privilege)
        .map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
