//! Scripted batch runner: walks every script section against the growing
//! history, then compiles the final document.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ProgressMode;
use crate::llm::ChatMessage;

use super::chat::{ChatClient, ChatOutcome};
use super::model::ChatModel;
use super::prompts::{COMPILE_PROMPT, SCRIPT};
use super::state::{STATUS_FINALIZING, Session};

/// One batch run bound to a single session.
pub struct BatchRunner {
    chat: ChatClient,
    session: Arc<RwLock<Session>>,
    session_id: Uuid,
    model: ChatModel,
    step_delay: Duration,
    progress_mode: ProgressMode,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// `cancel` is normally a child of the session's token, so replacing the
    /// session also stops the run.
    pub fn new(
        chat: ChatClient,
        session: Arc<RwLock<Session>>,
        session_id: Uuid,
        model: ChatModel,
        step_delay: Duration,
        progress_mode: ProgressMode,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            chat,
            session,
            session_id,
            model,
            step_delay,
            progress_mode,
            cancel,
        }
    }

    /// Start the run on the tokio runtime.
    pub fn spawn(self) -> RunHandle {
        let session_id = self.session_id;
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(self.run());
        RunHandle {
            session_id,
            cancel,
            handle,
        }
    }

    /// Apply `f` to the session unless this run was cancelled or superseded.
    async fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut session = self.session.write().await;
        if self.cancel.is_cancelled() || session.id != self.session_id {
            return None;
        }
        Some(f(&mut session))
    }

    /// Ask the model, returning `None` if the run is cancelled meanwhile.
    async fn ask(&self, prompt: &str, history: &[ChatMessage]) -> Option<ChatOutcome> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = self.chat.ask(prompt, self.model, history) => Some(outcome),
        }
    }

    async fn run(self) {
        if self.update(Session::begin_batch).await.is_none() {
            return;
        }
        info!(session_id = %self.session_id, model = %self.model, sections = SCRIPT.len(), "Scripted batch started");

        let total = SCRIPT.len();
        for (index, entry) in SCRIPT.iter().enumerate() {
            let percent = self.progress_mode.percent(index, total);
            let Some(history) = self
                .update(|s| {
                    s.current_prompt_index = index;
                    s.status = entry.label.to_string();
                    s.raise_progress(percent);
                    s.history.clone()
                })
                .await
            else {
                return self.stopped(index);
            };

            debug!(session_id = %self.session_id, index, label = entry.label, "Running script section");

            let Some(outcome) = self.ask(entry.prompt, &history).await else {
                return self.stopped(index);
            };
            let failed = outcome.is_failed();
            let reply = outcome.into_text();
            let recorded = self
                .update(|s| {
                    if failed {
                        s.failed_steps += 1;
                    }
                    s.push_exchange(entry.prompt, reply);
                })
                .await;
            if recorded.is_none() {
                return self.stopped(index);
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.stopped(index),
                _ = tokio::time::sleep(self.step_delay) => {}
            }
        }

        let Some(history) = self
            .update(|s| {
                s.status = STATUS_FINALIZING.to_string();
                s.history.clone()
            })
            .await
        else {
            return self.stopped(total);
        };

        let Some(outcome) = self.ask(COMPILE_PROMPT, &history).await else {
            return self.stopped(total);
        };
        let failed = outcome.is_failed();
        let document = outcome.into_text();
        let stored = self
            .update(|s| {
                if failed {
                    s.failed_steps += 1;
                }
                s.complete(document);
                s.failed_steps
            })
            .await;

        match stored {
            Some(0) => info!(session_id = %self.session_id, "Scripted batch complete"),
            Some(failed_steps) => warn!(
                session_id = %self.session_id,
                failed_steps,
                "Scripted batch complete with upstream errors in the document"
            ),
            None => self.stopped(total),
        }
    }

    fn stopped(&self, index: usize) {
        info!(session_id = %self.session_id, index, "Scripted batch stopped before completion");
    }
}

/// Handle to a spawned batch run.
#[derive(Debug)]
pub struct RunHandle {
    session_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request cancellation and wait for the task to exit.
    pub async fn cancel_and_wait(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(session_id = %self.session_id, error = %e, "Batch task ended abnormally");
        }
    }
}
