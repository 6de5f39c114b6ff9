// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::generate_image::{generate_image_handler, generate_image_stream_handler};
use super::handlers::{
    check_prompt_handler, get_artifact_handler, health_handler, resolve_template_handler,
};
use crate::config::{PrivilegeResolver, ServerConfig};
use crate::diffusion::{
    DiffusionClient, HttpImageFetcher, ImageGenerationRateLimiter, ImageProvider,
};
use crate::generation::{GenerationOrchestrator, OrchestratorConfig};
use crate::storage::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub rate_limiter: Arc<ImageGenerationRateLimiter>,
    pub privileges: Arc<PrivilegeResolver>,
}

impl AppState {
    pub fn new(
        orchestrator: GenerationOrchestrator,
        rate_limiter: ImageGenerationRateLimiter,
        privileges: PrivilegeResolver,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            rate_limiter: Arc::new(rate_limiter),
            privileges: Arc::new(privileges),
        }
    }

    /// Wire the production collaborators described by `config`
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let provider: Option<Arc<dyn ImageProvider>> = match &config.provider.api_key {
            Some(api_key) => {
                let client = DiffusionClient::new(
                    &config.provider.endpoint,
                    &config.provider.model,
                    api_key,
                    config.provider.timeout,
                )?
                .with_response_format(&config.provider.response_format)?;
                Some(Arc::new(client))
            }
            None => {
                warn!("IMAGE_PROVIDER_API_KEY not set; generation requests will fail");
                None
            }
        };

        let store: Arc<dyn ArtifactStore> = match &config.artifact_dir {
            Some(dir) => {
                info!("Storing artifacts in {}", dir.display());
                Arc::new(FsArtifactStore::new(dir, &config.artifact_base_url).await?)
            }
            None => {
                info!("Storing artifacts in memory");
                Arc::new(InMemoryArtifactStore::new(&config.artifact_base_url))
            }
        };

        let fetcher = Arc::new(HttpImageFetcher::new(config.fetch_timeout)?);
        let orchestrator = GenerationOrchestrator::new(provider, fetcher, store).with_config(
            OrchestratorConfig {
                provider_timeout: config.provider.timeout,
                fetch_timeout: config.fetch_timeout,
            },
        );

        Ok(Self::new(
            orchestrator,
            ImageGenerationRateLimiter::new(config.rate_limit_per_minute),
            PrivilegeResolver::new(config.privileged_codes.iter().cloned()),
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Generation
        .route("/generate", post(generate_image_handler))
        .route("/generate/stream", post(generate_image_stream_handler))
        // Prompt tooling
        .route("/templates/resolve", post(resolve_template_handler))
        .route("/prompts/check", post(check_prompt_handler))
        // Stored images
        .route("/artifacts/:id", get(get_artifact_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, bind_address: &str) -> Result<()> {
    let addr = bind_address
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid bind address '{}'", bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("API server listening on {}", addr);

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
