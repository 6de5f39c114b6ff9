// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation API endpoint module
//!
//! Provides POST /generate and POST /generate/stream.

pub mod handler;
pub mod response;

pub use handler::{caller_key, generate_image_handler, generate_image_stream_handler};
pub use response::GenerateImageResponse;
