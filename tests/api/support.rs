// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router construction and request helpers for the HTTP tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{orchestrator_with, FakeFetcher};
use fabstir_image_gen::api::{build_router, AppState};
use fabstir_image_gen::config::PrivilegeResolver;
use fabstir_image_gen::diffusion::provider::ImageProvider;
use fabstir_image_gen::diffusion::rate_limiter::ImageGenerationRateLimiter;
use fabstir_image_gen::generation::GenerationOrchestrator;
use fabstir_image_gen::storage::InMemoryArtifactStore;

pub const VIP_CODE: &str = "vip-code";

/// Router over fakes with a generous rate limit and one privileged code
pub fn app(
    provider: Option<Arc<dyn ImageProvider>>,
    fetcher: FakeFetcher,
) -> (Router, InMemoryArtifactStore) {
    app_with_limit(provider, fetcher, 100)
}

pub fn app_with_limit(
    provider: Option<Arc<dyn ImageProvider>>,
    fetcher: FakeFetcher,
    per_minute: usize,
) -> (Router, InMemoryArtifactStore) {
    let (orchestrator, store) = orchestrator_with(provider, Arc::new(fetcher));
    (router_for(orchestrator, per_minute), store)
}

pub fn router_for(orchestrator: GenerationOrchestrator, per_minute: usize) -> Router {
    build_router(AppState::new(
        orchestrator,
        ImageGenerationRateLimiter::new(per_minute),
        PrivilegeResolver::new([VIP_CODE]),
    ))
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    body: &str,
    access_code: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(code) = access_code {
        builder = builder.header("x-access-code", code);
    }
    router
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn get(router: &Router, uri: &str, if_none_match: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(etag) = if_none_match {
        builder = builder.header(header::IF_NONE_MATCH, etag);
    }
    router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Status plus parsed JSON body
pub async fn json_response(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    (status, json_body(response).await)
}

/// Every `data:` payload of an SSE body, parsed as JSON
pub async fn sse_frames(response: Response<Body>) -> Vec<Value> {
    let raw = String::from_utf8(body_bytes(response).await).unwrap();
    raw.split("\n\n")
        .filter_map(|frame| {
            let data: Vec<&str> = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            (!data.is_empty()).then(|| data.join("\n"))
        })
        .map(|data| serde_json::from_str(&data).unwrap())
        .collect()
}

pub fn is_terminal(frame: &Value) -> bool {
    frame["type"] != "progress"
}
