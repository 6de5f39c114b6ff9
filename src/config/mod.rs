// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration from the process environment

pub mod privilege;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub use privilege::{PrivilegeResolver, ACCESS_CODE_HEADER};

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub endpoint: String,
    /// Absent means generation is unavailable until configured
    pub api_key: Option<String>,
    pub model: String,
    pub response_format: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderSettings,
    pub fetch_timeout: Duration,
    pub artifact_dir: Option<PathBuf>,
    pub artifact_base_url: String,
    pub privileged_codes: Vec<String>,
    pub rate_limit_per_minute: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            provider: ProviderSettings {
                endpoint: "https://api.openai.com".to_string(),
                api_key: None,
                model: "dall-e-2".to_string(),
                response_format: "url".to_string(),
                timeout: Duration::from_secs(120),
            },
            fetch_timeout: Duration::from_secs(30),
            artifact_dir: None,
            artifact_base_url: "/artifacts".to_string(),
            privileged_codes: Vec::new(),
            rate_limit_per_minute: 10,
        }
    }
}

impl ServerConfig {
    /// Read every setting from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            host: get("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&get, "API_PORT", defaults.port)?,
            provider: ProviderSettings {
                endpoint: get("IMAGE_PROVIDER_URL").unwrap_or(defaults.provider.endpoint),
                api_key: get("IMAGE_PROVIDER_API_KEY"),
                model: get("IMAGE_PROVIDER_MODEL").unwrap_or(defaults.provider.model),
                response_format: get("IMAGE_PROVIDER_RESPONSE_FORMAT")
                    .unwrap_or(defaults.provider.response_format),
                timeout: Duration::from_secs(parse_var(
                    &get,
                    "PROVIDER_TIMEOUT_SECS",
                    defaults.provider.timeout.as_secs(),
                )?),
            },
            fetch_timeout: Duration::from_secs(parse_var(
                &get,
                "IMAGE_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            artifact_dir: get("ARTIFACT_DIR").map(PathBuf::from),
            artifact_base_url: get("ARTIFACT_BASE_URL").unwrap_or(defaults.artifact_base_url),
            privileged_codes: get("PRIVILEGED_ACCESS_CODES")
                .map(|codes| {
                    codes
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_per_minute: parse_var(
                &get,
                "IMAGE_RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
