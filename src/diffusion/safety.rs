// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Safety verdict types for prompt moderation

use serde::{Deserialize, Serialize};

/// Moderator verdict granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetySeverity {
    Safe,
    Warn,
    Block,
}

/// Categories of blocked content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    MinorSexual,
    Sexual,
    Violence,
    SelfHarm,
    Hate,
    Illegal,
}

/// Result of a moderation check.
///
/// `cleaned` is present unless blocked; `reason` only when blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyResult {
    pub allowed: bool,
    pub severity: SafetySeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SafetyCategory>,
}

impl SafetyResult {
    pub fn safe(cleaned: String) -> Self {
        Self {
            allowed: true,
            severity: SafetySeverity::Safe,
            cleaned: Some(cleaned),
            reason: None,
            category: None,
        }
    }

    pub fn warn(cleaned: String) -> Self {
        Self {
            allowed: true,
            severity: SafetySeverity::Warn,
            cleaned: Some(cleaned),
            reason: None,
            category: None,
        }
    }

    pub fn blocked(category: SafetyCategory, reason: &str) -> Self {
        Self {
            allowed: false,
            severity: SafetySeverity::Block,
            cleaned: None,
            reason: Some(reason.to_string()),
            category: Some(category),
        }
    }
}
