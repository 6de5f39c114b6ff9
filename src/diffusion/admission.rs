// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Size admission: public size enum, caller privilege clamping, provider mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output sizes exposed on the public interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "512x512")]
    Square512,
    #[serde(rename = "768x768")]
    Square768,
    #[serde(rename = "1024x1024")]
    Square1024,
    /// Reserved for privileged callers
    #[serde(rename = "1024x1536")]
    Portrait1024x1536,
    /// Reserved for privileged callers
    #[serde(rename = "1536x1024")]
    Landscape1536x1024,
}

/// Every size accepted by validation
pub const ALLOWED_SIZES: &[ImageSize] = &[
    ImageSize::Square512,
    ImageSize::Square768,
    ImageSize::Square1024,
    ImageSize::Portrait1024x1536,
    ImageSize::Landscape1536x1024,
];

/// Sizes an unprivileged caller may actually receive
pub const STANDARD_SIZES: &[ImageSize] = &[
    ImageSize::Square512,
    ImageSize::Square768,
    ImageSize::Square1024,
];

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square512 => "512x512",
            ImageSize::Square768 => "768x768",
            ImageSize::Square1024 => "1024x1024",
            ImageSize::Portrait1024x1536 => "1024x1536",
            ImageSize::Landscape1536x1024 => "1536x1024",
        }
    }

    pub fn parse(s: &str) -> Option<ImageSize> {
        ALLOWED_SIZES
            .iter()
            .copied()
            .find(|size| size.as_str() == s.trim())
    }

    pub fn is_square(&self) -> bool {
        matches!(
            self,
            ImageSize::Square512 | ImageSize::Square768 | ImageSize::Square1024
        )
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square512 => (512, 512),
            ImageSize::Square768 => (768, 768),
            ImageSize::Square1024 => (1024, 1024),
            ImageSize::Portrait1024x1536 => (1024, 1536),
            ImageSize::Landscape1536x1024 => (1536, 1024),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The narrower size set the provider accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderSize {
    #[serde(rename = "512x512")]
    Square512,
    #[serde(rename = "1024x1024")]
    Square1024,
}

impl ProviderSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderSize::Square512 => "512x512",
            ProviderSize::Square1024 => "1024x1024",
        }
    }
}

/// Caller privilege, resolved once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallerPrivilege {
    #[default]
    Standard,
    Privileged,
}

impl CallerPrivilege {
    pub fn is_privileged(&self) -> bool {
        matches!(self, CallerPrivilege::Privileged)
    }
}

/// Maps (requested size, privilege) to the size actually honoured.
///
/// Clamping is silent: it is a cost control, not a user-facing error.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    default_size: ImageSize,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            default_size: ImageSize::Square1024,
        }
    }
}

impl AdmissionPolicy {
    pub fn new(default_size: ImageSize) -> Self {
        Self { default_size }
    }

    pub fn default_size(&self) -> ImageSize {
        self.default_size
    }

    /// Absent size ("auto") resolves to the default for everyone
    pub fn effective_size(
        &self,
        requested: Option<ImageSize>,
        privilege: CallerPrivilege,
    ) -> ImageSize {
        match requested {
            None => self.default_size,
            Some(size) if privilege.is_privileged() => size,
            Some(size) if STANDARD_SIZES.contains(&size) => size,
            Some(_) => self.default_size,
        }
    }

    /// Fixed lookup into the provider's size set
    pub fn provider_size(size: ImageSize) -> ProviderSize {
        match size {
            ImageSize::Square512 => ProviderSize::Square512,
            _ => ProviderSize::Square1024,
        }
    }
}
