// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fakes for generation and API tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fabstir_image_gen::diffusion::fetcher::{FetchError, FetchedImage, ImageFetcher};
use fabstir_image_gen::diffusion::provider::{
    ImageProvider, ProviderError, ProviderImage, ProviderRequest,
};
use fabstir_image_gen::generation::{
    GenerationOrchestrator, OrchestratorConfig, ProgressEvent, ProgressSink,
};
use fabstir_image_gen::storage::{ArtifactStore, InMemoryArtifactStore};

/// Minimal bytes recognised as PNG by format sniffing
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

/// JPEG start-of-image marker plus JFIF header
pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0\x01\x01\0\0\x01\0\x01\0\0";

pub fn url_image(url: &str) -> Option<ProviderImage> {
    Some(ProviderImage::Url {
        url: url.to_string(),
    })
}

pub fn inline_image(bytes: &[u8]) -> Option<ProviderImage> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    Some(ProviderImage::Inline {
        b64_json: STANDARD.encode(bytes),
    })
}

/// Provider returning a canned result and recording every call
pub struct FakeProvider {
    response: Mutex<Result<Vec<Option<ProviderImage>>, ProviderError>>,
    calls: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl FakeProvider {
    pub fn returning(records: Vec<Option<ProviderImage>>) -> Self {
        Self {
            response: Mutex::new(Ok(records)),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> Result<Vec<Option<ProviderImage>>, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().unwrap().clone()
    }
}

/// Provider that panics, standing in for an uncaught defect
pub struct PanickingProvider;

#[async_trait]
impl ImageProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn generate(
        &self,
        _request: &ProviderRequest,
    ) -> Result<Vec<Option<ProviderImage>>, ProviderError> {
        panic!("provider exploded")
    }
}

/// Fetcher serving canned bytes per URL; unknown URLs answer 404
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(url.to_string(), Ok(bytes.to_vec()));
        self
    }

    pub fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Ok(bytes)) => Ok(FetchedImage {
                bytes: bytes.clone(),
                content_type: "image/png".to_string(),
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Orchestrator over fakes plus a handle on its in-memory store
pub fn orchestrator_with(
    provider: Option<Arc<dyn ImageProvider>>,
    fetcher: Arc<FakeFetcher>,
) -> (GenerationOrchestrator, InMemoryArtifactStore) {
    let store = InMemoryArtifactStore::new("https://img.test/artifacts");
    let store_handle: Arc<dyn ArtifactStore> = Arc::new(store.clone());
    let orchestrator = GenerationOrchestrator::new(provider, fetcher, store_handle).with_config(
        OrchestratorConfig {
            provider_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(5),
        },
    );
    (orchestrator, store)
}

pub fn fake_orchestrator(
    provider: Arc<FakeProvider>,
    fetcher: FakeFetcher,
) -> (GenerationOrchestrator, InMemoryArtifactStore) {
    let provider: Arc<dyn ImageProvider> = provider;
    orchestrator_with(Some(provider), Arc::new(fetcher))
}

/// Sink that records every event in order
pub fn collecting_sink() -> (ProgressSink, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: ProgressSink = Arc::new(move |event| sink_events.lock().unwrap().push(event));
    (sink, events)
}
