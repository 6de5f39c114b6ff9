// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod generate_image;
pub mod handlers;
pub mod http_server;
pub mod streaming;

pub use errors::{ApiError, ErrorResponse};
pub use generate_image::{generate_image_handler, generate_image_stream_handler, GenerateImageResponse};
pub use handlers::{CheckPromptRequest, HealthResponse, ResolveTemplateRequest};
pub use http_server::{build_router, start_server, AppState};
pub use streaming::{spawn_generation, ProgressStream};
