// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Progress events emitted by the orchestrator

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::GenerationError;
use crate::storage::Artifact;

/// Progress after admission and prompt composition
pub const PROGRESS_COMPOSED: u8 = 10;
/// Progress once the provider call returns
pub const PROGRESS_PROVIDER_RETURNED: u8 = 30;
/// Per-image progress is spread between PROVIDER_RETURNED and this ceiling
pub const PROGRESS_DOWNLOAD_CEILING: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressEventType {
    Progress,
    Complete,
    Error,
}

/// Lifecycle phase reported in `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Uploading,
    Processing,
    Generating,
    Downloading,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: ProgressEventType,
    pub status: GenerationStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Artifact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn progress(status: GenerationStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            event_type: ProgressEventType::Progress,
            status,
            progress: progress.min(100),
            message: message.into(),
            generated_count: None,
            total_count: None,
            images: None,
            error: None,
        }
    }

    pub fn complete(artifacts: &[Artifact], total: usize) -> Self {
        Self {
            event_type: ProgressEventType::Complete,
            status: GenerationStatus::Complete,
            progress: 100,
            message: format!("Generated {} of {} images", artifacts.len(), total),
            generated_count: Some(artifacts.len()),
            total_count: Some(total),
            images: Some(artifacts.to_vec()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>, progress: u8) -> Self {
        Self {
            event_type: ProgressEventType::Error,
            status: GenerationStatus::Error,
            progress: progress.min(100),
            message: message.into(),
            generated_count: None,
            total_count: None,
            images: None,
            error: Some(error.into()),
        }
    }

    pub fn with_counts(mut self, generated: usize, total: usize) -> Self {
        self.generated_count = Some(generated);
        self.total_count = Some(total);
        self
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.event_type, ProgressEventType::Progress)
    }
}

/// Callback receiving every event of one generation, in order
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress after the `index`-th of `total` images has been persisted
pub fn per_image_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_DOWNLOAD_CEILING;
    }
    let span = (PROGRESS_DOWNLOAD_CEILING - PROGRESS_PROVIDER_RETURNED) as usize;
    let done = (index + 1).min(total);
    PROGRESS_PROVIDER_RETURNED + (span * done / total) as u8
}

/// Enforces the event contract for one request: progress never decreases and
/// exactly one terminal event is emitted, after which nothing is.
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
    last_progress: u8,
    finished: bool,
}

impl ProgressReporter {
    pub fn new(sink: Option<ProgressSink>) -> Self {
        Self {
            sink,
            last_progress: 0,
            finished: false,
        }
    }

    pub fn last_progress(&self) -> u8 {
        self.last_progress
    }

    fn emit(&mut self, mut event: ProgressEvent) {
        if self.finished {
            return;
        }
        event.progress = event.progress.max(self.last_progress);
        self.last_progress = event.progress;
        self.finished = event.is_terminal();
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    pub fn progress(&mut self, event: ProgressEvent) {
        debug_assert!(!event.is_terminal());
        self.emit(event);
    }

    pub fn complete(&mut self, artifacts: &[Artifact], total: usize) {
        self.emit(ProgressEvent::complete(artifacts, total));
    }

    pub fn fail(&mut self, error: &GenerationError) {
        let progress = self.last_progress;
        self.emit(ProgressEvent::failure(
            error.user_message(),
            error.to_string(),
            progress,
        ));
    }
}
