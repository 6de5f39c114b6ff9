// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::diffusion::provider::ProviderError;
use crate::generation::GenerationError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    SafetyBlocked {
        reason: String,
    },
    RateLimitExceeded {
        retry_after: u64,
    },
    ServiceUnavailable(String),
    /// The image provider or the image downloads failed
    Upstream {
        code: &'static str,
        message: String,
    },
    Timeout(String),
    Cancelled,
    InternalError(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::SafetyBlocked { .. } => "safety_blocked",
            ApiError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Upstream { .. } => "upstream_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::Cancelled => "cancelled",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let mut details = HashMap::new();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Timeout(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::ValidationError { field, message } => {
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                message.clone()
            }
            ApiError::SafetyBlocked { reason } => {
                details.insert(
                    "reason".to_string(),
                    serde_json::Value::String(reason.clone()),
                );
                format!("Prompt blocked by safety filter: {}", reason)
            }
            ApiError::RateLimitExceeded { retry_after } => {
                details.insert(
                    "retry_after".to_string(),
                    serde_json::Value::Number((*retry_after).into()),
                );
                "Rate limit exceeded".to_string()
            }
            ApiError::Upstream { code, message } => {
                details.insert(
                    "upstream_code".to_string(),
                    serde_json::Value::String(code.to_string()),
                );
                message.clone()
            }
            ApiError::Cancelled => "Request cancelled".to_string(),
        };

        ErrorResponse {
            error: message,
            code: self.code().to_string(),
            request_id,
            details: (!details.is_empty()).then_some(details),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::SafetyBlocked { .. } => 400,
            ApiError::RateLimitExceeded { .. } => 429,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Upstream { .. } => 502,
            ApiError::Timeout(_) => 504,
            // nginx's "client closed request"
            ApiError::Cancelled => 499,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation { field, message } => {
                ApiError::ValidationError { field, message }
            }
            GenerationError::SafetyBlocked { reason } => ApiError::SafetyBlocked { reason },
            GenerationError::Configuration(msg) => ApiError::ServiceUnavailable(format!(
                "Image generation is not configured: {}",
                msg
            )),
            GenerationError::Provider(ProviderError::Timeout { secs }) => {
                ApiError::Timeout(format!("Image provider timed out after {}s", secs))
            }
            GenerationError::Provider(e) => ApiError::Upstream {
                code: e.error_code(),
                message: e.to_string(),
            },
            e @ GenerationError::NoImagesMaterialized { .. } => ApiError::Upstream {
                code: e.error_code(),
                message: e.to_string(),
            },
            GenerationError::Cancelled => ApiError::Cancelled,
            GenerationError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::SafetyBlocked { reason } => write!(f, "Prompt blocked: {}", reason),
            ApiError::RateLimitExceeded { retry_after } => write!(
                f,
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            ),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Upstream { code, message } => write!(f, "Upstream error {}: {}", code, message),
            ApiError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ApiError::Cancelled => write!(f, "Request cancelled"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_response(None))).into_response();
        if let ApiError::RateLimitExceeded { retry_after } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
