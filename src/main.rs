// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_image_gen::{
    api::{start_server, AppState},
    config::ServerConfig,
    version,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Fabstir Image Gen...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = ServerConfig::from_env()?;
    let state = AppState::from_config(&config).await?;

    if state.orchestrator.is_provider_configured() {
        println!("✅ Image provider configured");
    } else {
        println!("⚠️  No image provider credential; /generate will return 503");
    }
    println!("🌐 Listening on {}", config.bind_address());

    start_server(state, &config.bind_address()).await?;

    tracing::info!("{} stopped", version::get_version_string());
    Ok(())
}
