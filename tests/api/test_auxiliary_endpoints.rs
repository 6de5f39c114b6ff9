// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for /health, /templates/resolve, /prompts/check and /artifacts/:id

use axum::http::{header, StatusCode};
use std::sync::Arc;

use super::support::{app, body_bytes, get, json_response, post_json};
use crate::common::{FakeFetcher, FakeProvider, JPEG_BYTES};
use fabstir_image_gen::storage::{content_digest, ArtifactMetadata, ArtifactStore, NewArtifact};

fn configured_app() -> (axum::Router, fabstir_image_gen::storage::InMemoryArtifactStore) {
    app(
        Some(Arc::new(FakeProvider::returning(vec![]))),
        FakeFetcher::new(),
    )
}

#[tokio::test]
async fn test_health_reports_provider_configuration() {
    let (router, _) = configured_app();
    let (status, json) = json_response(get(&router, "/health", None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["build"], fabstir_image_gen::version::VERSION);
    assert!(json["features"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("sse-progress")));
    assert_eq!(json["providerConfigured"], true);

    let (router, _) = app(None, FakeFetcher::new());
    let (_, json) = json_response(get(&router, "/health", None).await).await;
    assert_eq!(json["providerConfigured"], false);
}

#[tokio::test]
async fn test_resolve_template_endpoint() {
    let (router, _) = configured_app();
    let body = r#"{"template": "[[x|upper|prefix:Hello ,true]]", "context": {"x": "world"}}"#;
    let (status, json) = json_response(post_json(&router, "/templates/resolve", body, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"], "Hello WORLD");
    assert_eq!(json["errors"], serde_json::json!([]));
}

#[tokio::test]
async fn test_resolve_template_errors_are_reported_not_fatal() {
    let (router, _) = configured_app();
    let body = r#"{"template": "a fox [[missing]] in snow"}"#;
    let (status, json) = json_response(post_json(&router, "/templates/resolve", body, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"], "a fox in snow");
    assert_eq!(json["errors"][0], "unknown variable 'missing'");
}

#[tokio::test]
async fn test_resolve_template_rejects_malformed_body() {
    let (router, _) = configured_app();
    let (status, json) =
        json_response(post_json(&router, "/templates/resolve", r#"{"context": {}}"#, None).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_request");
}

#[tokio::test]
async fn test_check_prompt_previews_final_prompt() {
    let (router, _) = configured_app();
    let body = r#"{"prompt": "Lighting: soft dusk over a harbor"}"#;
    let (status, json) = json_response(post_json(&router, "/prompts/check", body, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["safety"]["allowed"], true);
    assert_eq!(json["safety"]["severity"], "safe");
    assert_eq!(
        json["finalPrompt"],
        "soft dusk over a harbor. No text, letters, or watermarks in the image."
    );
}

#[tokio::test]
async fn test_check_prompt_blocked_has_no_final_prompt() {
    let (router, _) = configured_app();
    let body = r#"{"prompt": "a gory battlefield"}"#;
    let (status, json) = json_response(post_json(&router, "/prompts/check", body, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["safety"]["allowed"], false);
    assert_eq!(json["safety"]["reason"], "graphic violence");
    assert!(json.get("finalPrompt").is_none());
}

#[tokio::test]
async fn test_check_prompt_blank_is_validation_error() {
    let (router, _) = configured_app();
    let (status, json) =
        json_response(post_json(&router, "/prompts/check", r#"{"prompt": "  "}"#, None).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
}

#[tokio::test]
async fn test_artifact_served_with_etag_and_revalidation() {
    let (router, store) = configured_app();
    let artifact = store
        .put(NewArtifact {
            bytes: JPEG_BYTES.to_vec(),
            content_type: "image/jpeg".to_string(),
            metadata: ArtifactMetadata {
                prompt: "a fox".to_string(),
                expanded_prompt: None,
                size: "512x512".to_string(),
                seed: None,
                base_image_id: None,
                has_mask: false,
                provider: "fake".to_string(),
            },
        })
        .await
        .unwrap();
    let uri = format!("/artifacts/{}", artifact.id);
    let etag = format!("\"{}\"", content_digest(JPEG_BYTES));

    let response = get(&router, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(response.headers()[header::ETAG], etag.as_str());
    assert!(response.headers()[header::CACHE_CONTROL]
        .to_str()
        .unwrap()
        .contains("immutable"));
    assert_eq!(body_bytes(response).await, JPEG_BYTES);

    let revalidated = get(&router, &uri, Some(&etag)).await;
    assert_eq!(revalidated.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(revalidated).await.is_empty());

    let stale = get(&router, &uri, Some("\"something-else\"")).await;
    assert_eq!(stale.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_or_invalid_artifact_is_404() {
    let (router, _) = configured_app();

    let (status, json) = json_response(get(&router, "/artifacts/does-not-exist", None).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");

    let response = get(&router, "/artifacts/bad.id", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
