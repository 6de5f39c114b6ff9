// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod materialize;
pub mod orchestrator;
pub mod progress;
pub mod request;

pub use errors::GenerationError;
pub use materialize::{MaterializeError, MaterializedImage};
pub use orchestrator::{
    GenerationOrchestrator, GenerationOutcome, OrchestratorConfig, PromptPreview,
};
pub use progress::{
    GenerationStatus, ProgressEvent, ProgressEventType, ProgressReporter, ProgressSink,
};
pub use request::{GenerationRequest, ValidatedRequest, MAX_IMAGES};
