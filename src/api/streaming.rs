// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-sent progress stream for one generation
//!
//! The stream yields events in order and ends right after the first terminal
//! event. If the generation task dies without producing one, a terminal error
//! is synthesized so the client never waits on an open connection.

use axum::response::sse::Event;
use futures::stream::Stream;
use std::any::Any;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error};

use crate::diffusion::admission::CallerPrivilege;
use crate::generation::{
    GenerationOrchestrator, GenerationRequest, ProgressEvent, ProgressSink,
};

const UNEXPECTED_FAILURE: &str = "Generation failed unexpectedly";

pub struct ProgressStream {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
    last_progress: u8,
    finished: bool,
    // Cancels the generation when the client goes away
    _cancel_on_drop: DropGuard,
}

impl ProgressStream {
    pub fn new(receiver: mpsc::UnboundedReceiver<ProgressEvent>, cancel: CancellationToken) -> Self {
        Self {
            receiver,
            last_progress: 0,
            finished: false,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(mut event)) => {
                event.progress = event.progress.max(self.last_progress);
                self.last_progress = event.progress;
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                // Producer gone without a terminal event
                self.finished = true;
                Poll::Ready(Some(ProgressEvent::failure(
                    UNEXPECTED_FAILURE,
                    "generation ended without a result",
                    self.last_progress,
                )))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Run `generate` on its own task and expose its events as a stream
pub fn spawn_generation(
    orchestrator: Arc<GenerationOrchestrator>,
    request: GenerationRequest,
    privilege: CallerPrivilege,
) -> ProgressStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let sink_tx = tx.clone();
    let sink: ProgressSink = Arc::new(move |event| {
        // Receiver dropped means the client disconnected
        let _ = sink_tx.send(event);
    });

    let task_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        orchestrator
            .generate(request, privilege, Some(sink), task_cancel)
            .await
    });

    tokio::spawn(async move {
        match handle.await {
            Ok(result) => debug!("Streaming generation finished: ok={}", result.is_ok()),
            Err(join_error) => {
                let message = join_error_message(join_error);
                error!("Generation task aborted: {}", message);
                let _ = tx.send(ProgressEvent::failure(UNEXPECTED_FAILURE, message, 0));
            }
        }
    });

    ProgressStream::new(rx, cancel)
}

/// One SSE frame: `data: <json>\n\n`
pub fn to_sse_event(event: &ProgressEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "generation task was cancelled".to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
