// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image provider access and the prompt safety pipeline

pub mod admission;
pub mod client;
pub mod fetcher;
pub mod prompt_safety;
pub mod provider;
pub mod rate_limiter;
pub mod safety;
pub mod sanitizer;

pub use admission::{AdmissionPolicy, CallerPrivilege, ImageSize, ProviderSize, ALLOWED_SIZES};
pub use client::DiffusionClient;
pub use fetcher::{FetchError, FetchedImage, HttpImageFetcher, ImageFetcher};
pub use prompt_safety::PromptModerator;
pub use provider::{ImageProvider, ProviderError, ProviderImage, ProviderRequest, ReferenceImage};
pub use rate_limiter::ImageGenerationRateLimiter;
pub use safety::{SafetyCategory, SafetyResult, SafetySeverity};
pub use sanitizer::PromptSanitizer;
