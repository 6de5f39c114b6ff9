// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir image generation service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-image-gen-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "prompt-templates",
    "prompt-moderation",
    "prompt-sanitization",
    "multi-image-generation",
    "partial-failure-tolerance",
    "sse-progress",
    "size-admission",
    "reference-image-edit",
    "rate-limiting",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Image Gen {} ({})", VERSION_NUMBER, BUILD_DATE)
}
