// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation error taxonomy
//!
//! The orchestrator is the single normalisation point: callers above it never
//! see raw provider or storage errors, only `GenerationError`.

use thiserror::Error;

use crate::diffusion::provider::ProviderError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Request rejected before any provider call
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Moderator verdict was `block`
    #[error("prompt blocked by safety filter: {reason}")]
    SafetyBlocked { reason: String },

    /// Operator-fixable: no provider credential
    #[error("image provider is not configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered but not a single image could be materialised
    #[error("none of the {total} generated images could be retrieved")]
    NoImagesMaterialized { total: usize },

    #[error("generation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GenerationError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        GenerationError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GenerationError::Validation { .. } => "VALIDATION_ERROR",
            GenerationError::SafetyBlocked { .. } => "SAFETY_BLOCKED",
            GenerationError::Configuration(_) => "CONFIGURATION_ERROR",
            GenerationError::Provider(e) => e.error_code(),
            GenerationError::NoImagesMaterialized { .. } => "NO_IMAGES_MATERIALIZED",
            GenerationError::Cancelled => "CANCELLED",
            GenerationError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message suitable for the `message` field of a terminal progress event
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Validation { message, .. } => format!("Invalid request: {}", message),
            GenerationError::SafetyBlocked { reason } => {
                format!("Prompt rejected by content policy ({})", reason)
            }
            GenerationError::Configuration(_) => {
                "Image generation is not available right now".to_string()
            }
            GenerationError::Provider(ProviderError::RateLimited(_)) => {
                "The image provider is busy, please retry shortly".to_string()
            }
            GenerationError::Provider(_) => "The image provider failed to generate images".to_string(),
            GenerationError::NoImagesMaterialized { .. } => {
                "Images were generated but none could be retrieved".to_string()
            }
            GenerationError::Cancelled => "Generation cancelled".to_string(),
            GenerationError::Internal(_) => "Generation failed unexpectedly".to_string(),
        }
    }

    /// Whether the caller may reasonably resubmit the same request later.
    /// Nothing is retried inside the orchestrator.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Provider(
                ProviderError::RateLimited(_)
                    | ProviderError::Network(_)
                    | ProviderError::Timeout { .. }
            ) | GenerationError::NoImagesMaterialized { .. }
        )
    }
}
