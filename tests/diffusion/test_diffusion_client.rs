// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the OpenAI-compatible diffusion client

use reqwest::StatusCode;
use std::time::Duration;

use fabstir_image_gen::diffusion::admission::ProviderSize;
use fabstir_image_gen::diffusion::client::{classify_status, DiffusionClient, OpenAIImageResponse};
use fabstir_image_gen::diffusion::provider::{
    ImageProvider, ProviderError, ProviderImage, ProviderRequest, ReferenceImage,
};

fn client() -> DiffusionClient {
    DiffusionClient::new("http://localhost:8082/", "flux-schnell", "sk-test", Duration::from_secs(5))
        .unwrap()
}

fn request() -> ProviderRequest {
    ProviderRequest {
        prompt: "A cat in space".to_string(),
        size: ProviderSize::Square1024,
        n: 2,
        seed: None,
        reference: None,
    }
}

#[test]
fn test_diffusion_client_new_trims_endpoint() {
    let client = client();
    assert_eq!(client.endpoint(), "http://localhost:8082");
    assert_eq!(client.model_name(), "flux-schnell");
    assert_eq!(client.response_format(), "url");
    assert_eq!(client.name(), "openai-compatible");
}

#[test]
fn test_response_format_validation() {
    let formatted = client().with_response_format("b64_json").unwrap();
    assert_eq!(formatted.response_format(), "b64_json");
    assert!(client().with_response_format("png").is_err());
}

#[test]
fn test_request_body_basic_fields() {
    let body = client().request_body(&request());
    assert_eq!(body["prompt"], "A cat in space");
    assert_eq!(body["model"], "flux-schnell");
    assert_eq!(body["size"], "1024x1024");
    assert_eq!(body["n"], 2);
    assert_eq!(body["response_format"], "url");
    assert!(body.get("seed").is_none());
    assert!(body.get("image").is_none());
    assert!(body.get("mask").is_none());
}

#[test]
fn test_request_body_passes_seed_and_reference_through() {
    let mut req = request();
    req.size = ProviderSize::Square512;
    req.n = 1;
    req.seed = Some(serde_json::json!({"value": 42}));
    req.reference = Some(ReferenceImage {
        image: vec![1, 2, 3],
        mask: Some(vec![4, 5, 6]),
    });

    let body = client().request_body(&req);
    assert_eq!(body["size"], "512x512");
    assert_eq!(body["seed"], serde_json::json!({"value": 42}));
    assert_eq!(body["image"], "AQID");
    assert_eq!(body["mask"], "BAUG");
}

#[test]
fn test_response_records_resolved_at_boundary() {
    let json = r#"{"data": [
        {"url": "https://cdn.test/1.png"},
        {"b64_json": "AAAA"},
        {},
        {"url": "", "b64_json": "BBBB"},
        {"url": "https://cdn.test/5.png", "b64_json": "CCCC", "revised_prompt": "x"}
    ]}"#;
    let response: OpenAIImageResponse = serde_json::from_str(json).unwrap();
    let images = response.into_images();
    assert_eq!(
        images,
        vec![
            Some(ProviderImage::Url {
                url: "https://cdn.test/1.png".to_string()
            }),
            Some(ProviderImage::Inline {
                b64_json: "AAAA".to_string()
            }),
            None,
            Some(ProviderImage::Inline {
                b64_json: "BBBB".to_string()
            }),
            Some(ProviderImage::Url {
                url: "https://cdn.test/5.png".to_string()
            }),
        ]
    );
}

#[test]
fn test_response_without_data_is_empty() {
    let response: OpenAIImageResponse = serde_json::from_str("{}").unwrap();
    assert!(response.into_images().is_empty());
}

#[test]
fn test_classify_status() {
    assert_eq!(
        classify_status(StatusCode::UNAUTHORIZED, "bad key".to_string()),
        ProviderError::Unauthorized("bad key".to_string())
    );
    assert_eq!(
        classify_status(StatusCode::FORBIDDEN, "nope".to_string()),
        ProviderError::Unauthorized("nope".to_string())
    );
    assert_eq!(
        classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string()),
        ProviderError::RateLimited("slow down".to_string())
    );
    let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
    assert_eq!(
        err,
        ProviderError::Http {
            status: 500,
            body: "boom".to_string()
        }
    );
    assert_eq!(err.error_code(), "PROVIDER_HTTP_ERROR");
}

#[tokio::test]
async fn test_diffusion_client_health_check_unreachable() {
    let client =
        DiffusionClient::new("http://127.0.0.1:59999", "test-model", "k", Duration::from_secs(2))
            .unwrap();
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_generate_unreachable_is_network_error() {
    let client =
        DiffusionClient::new("http://127.0.0.1:59999", "test-model", "k", Duration::from_secs(2))
            .unwrap();
    let err = client.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)), "got {:?}", err);
}
