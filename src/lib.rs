// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod diffusion;
pub mod generation;
pub mod storage;
pub mod templates;
pub mod utils;
pub mod version;

// Re-export main types
pub use diffusion::{
    AdmissionPolicy, CallerPrivilege, ImageProvider, ImageSize, PromptModerator,
    PromptSanitizer, SafetyResult, SafetySeverity,
};
pub use generation::{
    GenerationError, GenerationOrchestrator, GenerationRequest, ProgressEvent, ProgressSink,
};
pub use storage::{Artifact, ArtifactStore};
pub use templates::{resolve, Resolution, TemplateContext, TemplateValue};
