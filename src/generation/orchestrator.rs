// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation orchestrator
//!
//! Pipeline for one request:
//! 1. Validate the request (no provider call on failure)
//! 2. Resolve the effective size through the admission policy
//! 3. Moderate, sanitize and compose the final prompt
//! 4. One provider call for all N images
//! 5. Materialize and persist each image in order, skipping failures
//! 6. Complete with K <= N artifacts, or fail when K == 0

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::GenerationError;
use super::materialize::{materialize, MaterializeError, MaterializedImage};
use super::progress::{
    per_image_progress, GenerationStatus, ProgressEvent, ProgressReporter, ProgressSink,
    PROGRESS_COMPOSED, PROGRESS_PROVIDER_RETURNED,
};
use super::request::{GenerationRequest, ValidatedRequest};
use crate::diffusion::admission::{AdmissionPolicy, CallerPrivilege, ImageSize};
use crate::diffusion::fetcher::ImageFetcher;
use crate::diffusion::prompt_safety::PromptModerator;
use crate::diffusion::provider::{
    ImageProvider, ProviderError, ProviderImage, ProviderRequest, ReferenceImage,
};
use crate::diffusion::safety::SafetyResult;
use crate::diffusion::sanitizer::PromptSanitizer;
use crate::storage::{Artifact, ArtifactMetadata, ArtifactStore, NewArtifact, StorageError};

/// Appended whenever a base image conditions the generation
pub const SCENE_PRESERVATION: &str = "Keep the same image and preserve the original scene, \
composition, lighting and background; transform only the subject as described.";

/// Appended after SCENE_PRESERVATION when a mask is present
pub const MASK_PRESERVATION: &str =
    "Change only the masked region and leave everything outside it untouched.";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub provider_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Moderation verdict plus the prompt that would be sent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreview {
    pub safety: SafetyResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub request_id: String,
    pub artifacts: Vec<Artifact>,
    /// Records the provider returned; `artifacts.len()` may be lower
    pub total_count: usize,
    pub effective_size: ImageSize,
    pub final_prompt: String,
}

pub struct GenerationOrchestrator {
    provider: Option<Arc<dyn ImageProvider>>,
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<dyn ArtifactStore>,
    admission: AdmissionPolicy,
    moderator: PromptModerator,
    sanitizer: PromptSanitizer,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    /// `provider` is `None` when no credential is configured; every
    /// generation then fails with a configuration error.
    pub fn new(
        provider: Option<Arc<dyn ImageProvider>>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            provider,
            fetcher,
            store,
            admission: AdmissionPolicy::default(),
            moderator: PromptModerator::new(),
            sanitizer: PromptSanitizer::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_provider_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Moderation and sanitization only; no base-image augmentation
    pub fn preview(&self, text: &str) -> PromptPreview {
        let safety = self.moderator.check(text);
        let final_prompt = safety
            .cleaned
            .as_deref()
            .filter(|_| safety.allowed)
            .map(|cleaned| self.sanitizer.clean(cleaned));
        PromptPreview {
            safety,
            final_prompt,
        }
    }

    /// Final provider prompt, or `SafetyBlocked`
    pub fn compose_prompt(
        &self,
        request: &ValidatedRequest,
        has_base_image: bool,
    ) -> Result<String, GenerationError> {
        let verdict = self.moderator.check(request.moderation_input());
        let cleaned = match (verdict.allowed, verdict.cleaned) {
            (true, Some(cleaned)) => cleaned,
            _ => {
                return Err(GenerationError::SafetyBlocked {
                    reason: verdict
                        .reason
                        .unwrap_or_else(|| "prompt blocked by safety filter".to_string()),
                })
            }
        };

        let mut prompt = self.sanitizer.clean(&cleaned);
        if has_base_image {
            prompt.push(' ');
            prompt.push_str(SCENE_PRESERVATION);
            if request.mask.is_some() {
                prompt.push(' ');
                prompt.push_str(MASK_PRESERVATION);
            }
        }
        Ok(prompt)
    }

    /// Run one generation. Every invocation delivers exactly one terminal
    /// event to `on_progress`, matching the returned result.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        privilege: CallerPrivilege,
        on_progress: Option<ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut reporter = ProgressReporter::new(on_progress);

        debug!(
            request_id = %request_id,
            prompt_len = request.prompt.len(),
            n = request.n,
            privileged = privilege.is_privileged(),
            "Generation request received"
        );

        let result = self
            .run(&request_id, &request, privilege, &mut reporter, &cancel)
            .await;

        match &result {
            Ok(outcome) => {
                info!(
                    request_id = %request_id,
                    generated = outcome.artifacts.len(),
                    total = outcome.total_count,
                    size = %outcome.effective_size,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generation complete"
                );
                reporter.complete(&outcome.artifacts, outcome.total_count);
            }
            Err(e) => {
                match e {
                    GenerationError::Validation { field, .. } => {
                        warn!(request_id = %request_id, field = %field, "Generation rejected: {}", e)
                    }
                    GenerationError::SafetyBlocked { reason } => {
                        warn!(request_id = %request_id, reason = %reason, "Prompt blocked")
                    }
                    GenerationError::Cancelled => {
                        info!(request_id = %request_id, "Generation cancelled by caller")
                    }
                    _ => error!(
                        request_id = %request_id,
                        code = e.error_code(),
                        "Generation failed: {}",
                        e
                    ),
                }
                reporter.fail(e);
            }
        }

        result
    }

    async fn run(
        &self,
        request_id: &str,
        request: &GenerationRequest,
        privilege: CallerPrivilege,
        reporter: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        // 1. Validate
        let validated = request.validate()?;

        // 2. Admission
        let effective_size = self.admission.effective_size(validated.size, privilege);
        if let Some(requested) = validated.size.filter(|s| *s != effective_size) {
            debug!(
                request_id = %request_id,
                requested = %requested,
                effective = %effective_size,
                "Requested size clamped"
            );
        }

        // 3. Moderate and compose
        let final_prompt = self.compose_prompt(&validated, validated.base_image_id.is_some())?;
        let provider = self.provider.as_ref().ok_or_else(|| {
            GenerationError::Configuration("no provider credential configured".to_string())
        })?;
        let reference = self.load_reference(&validated).await?;

        reporter.progress(ProgressEvent::progress(
            GenerationStatus::Generating,
            PROGRESS_COMPOSED,
            format!("Generating {} image(s)", validated.n),
        ));

        // 4. Single provider call
        let provider_request = ProviderRequest {
            prompt: final_prompt.clone(),
            size: AdmissionPolicy::provider_size(effective_size),
            n: validated.n,
            seed: validated.seed.clone(),
            reference,
        };
        let mut records = self
            .call_provider(provider.as_ref(), &provider_request, cancel)
            .await?;
        let requested = validated.n as usize;
        if records.len() > requested {
            warn!(
                request_id = %request_id,
                returned = records.len(),
                requested,
                "Provider returned more images than requested; extra records dropped"
            );
            records.truncate(requested);
        }
        let total = records.len();
        if total == 0 {
            return Err(GenerationError::NoImagesMaterialized { total });
        }

        reporter.progress(
            ProgressEvent::progress(
                GenerationStatus::Downloading,
                PROGRESS_PROVIDER_RETURNED,
                format!("Provider returned {} image(s)", total),
            )
            .with_counts(0, total),
        );

        // 5. Materialize and persist, in order
        let metadata = ArtifactMetadata {
            prompt: validated.prompt.clone(),
            expanded_prompt: validated.expanded_prompt.clone(),
            size: effective_size.as_str().to_string(),
            seed: validated.seed.clone(),
            base_image_id: validated.base_image_id.clone(),
            has_mask: validated.mask.is_some(),
            provider: provider.name().to_string(),
        };

        let mut artifacts = Vec::with_capacity(total);
        for (index, record) in records.into_iter().enumerate() {
            let image = match self.materialize_record(record, cancel).await? {
                Ok(image) => image,
                Err(e) => {
                    warn!(request_id = %request_id, index, "Skipping image: {}", e);
                    continue;
                }
            };

            let persisted = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                result = self.store.put(NewArtifact {
                    bytes: image.bytes,
                    content_type: image.content_type,
                    metadata: metadata.clone(),
                }) => result,
            };

            match persisted {
                Ok(artifact) => {
                    debug!(request_id = %request_id, index, artifact_id = %artifact.id, "Image persisted");
                    artifacts.push(artifact);
                    reporter.progress(
                        ProgressEvent::progress(
                            GenerationStatus::Downloading,
                            per_image_progress(index, total),
                            format!("Saved image {} of {}", index + 1, total),
                        )
                        .with_counts(artifacts.len(), total),
                    );
                }
                Err(e) => {
                    warn!(request_id = %request_id, index, "Failed to persist image: {}", e);
                }
            }
        }

        // 6. Completion policy
        if artifacts.is_empty() {
            return Err(GenerationError::NoImagesMaterialized { total });
        }

        Ok(GenerationOutcome {
            request_id: request_id.to_string(),
            artifacts,
            total_count: total,
            effective_size,
            final_prompt,
        })
    }

    async fn load_reference(
        &self,
        request: &ValidatedRequest,
    ) -> Result<Option<ReferenceImage>, GenerationError> {
        let Some(id) = request.base_image_id.as_deref() else {
            return Ok(None);
        };

        match self.store.get(id).await {
            Ok(Some(stored)) => Ok(Some(ReferenceImage {
                image: stored.bytes,
                mask: request.mask.clone(),
            })),
            Ok(None) => Err(GenerationError::validation(
                "baseImageId",
                format!("base image '{}' not found", id),
            )),
            Err(StorageError::InvalidId(_)) => Err(GenerationError::validation(
                "baseImageId",
                format!("invalid base image id '{}'", id),
            )),
            Err(e) => Err(GenerationError::Internal(format!(
                "failed to load base image: {}",
                e
            ))),
        }
    }

    async fn call_provider(
        &self,
        provider: &dyn ImageProvider,
        request: &ProviderRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<ProviderImage>>, GenerationError> {
        let limit = self.config.provider_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = timeout(limit, provider.generate(request)) => match result {
                Ok(Ok(records)) => Ok(records),
                Ok(Err(e)) => Err(GenerationError::Provider(e)),
                Err(_) => Err(GenerationError::Provider(ProviderError::Timeout {
                    secs: limit.as_secs(),
                })),
            },
        }
    }

    /// Outer error is fatal (cancellation); inner error skips this image
    async fn materialize_record(
        &self,
        record: Option<ProviderImage>,
        cancel: &CancellationToken,
    ) -> Result<Result<MaterializedImage, MaterializeError>, GenerationError> {
        let Some(image) = record else {
            return Ok(Err(MaterializeError::MissingPayload));
        };

        let limit = self.config.fetch_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = timeout(limit, materialize(&image, self.fetcher.as_ref())) => Ok(match result {
                Ok(inner) => inner,
                Err(_) => Err(MaterializeError::Timeout { secs: limit.as_secs() }),
            }),
        }
    }
}
