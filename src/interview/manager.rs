//! InterviewManager: owns the session, runs the intake steps and launches the
//! scripted batch.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::InterviewConfig;
use crate::error::InterviewError;
use crate::llm::{ChatMessage, LlmProvider};

use super::chat::{ChatClient, ChatOutcome};
use super::model::{ChatModel, DOCUMENT_FILENAME, DocumentDownload, ProgressSnapshot, StepReply};
use super::prompts::{
    BATCH_ACK, NICHE_USER_PROMPT, OFFER_USER_PROMPT, OPENING_PROMPT, niche_prompt, offer_prompt,
};
use super::runner::{BatchRunner, RunHandle};
use super::state::{InterviewStep, STATUS_ANALYSIS, Session};

/// Coordinates the single interview session.
///
/// Intake calls are serialized through `intake`, so only one of them talks to
/// the model at a time. Starting a session never waits on them: it cancels the
/// old session's token, which ends whatever intake or batch call is still
/// pending for it. The session lock is only held for short reads and writes,
/// never across a chat call.
pub struct InterviewManager {
    chat: ChatClient,
    config: InterviewConfig,
    session: Arc<RwLock<Session>>,
    intake: Mutex<()>,
    run: Mutex<Option<RunHandle>>,
}

/// What an intake call needs, copied out of the session.
struct IntakeContext {
    session_id: Uuid,
    model: ChatModel,
    history: Vec<ChatMessage>,
    cancel: CancellationToken,
}

impl InterviewManager {
    pub fn new(llm: Arc<dyn LlmProvider>, config: InterviewConfig) -> Self {
        Self {
            chat: ChatClient::new(llm, config.temperature),
            config,
            session: Arc::new(RwLock::new(Session::default())),
            intake: Mutex::new(()),
            run: Mutex::new(None),
        }
    }

    /// Start a new session, discarding the previous one.
    ///
    /// An unknown model falls back to the default. Pending intake calls and
    /// any batch of the old session are cancelled. Fails with `Superseded` if
    /// yet another start replaces this session before the opening reply
    /// arrives.
    pub async fn start_session(
        &self,
        requested_model: Option<&str>,
    ) -> Result<StepReply, InterviewError> {
        let model = match requested_model {
            None => ChatModel::default(),
            Some(id) => ChatModel::from_id(id).unwrap_or_else(|| {
                warn!(requested = id, fallback = %ChatModel::default(), "Unsupported model, using default");
                ChatModel::default()
            }),
        };

        let session = Session::start(model);
        let session_id = session.id;
        let cancel = session.cancel.clone();
        self.session.write().await.replace(session);
        info!(session_id = %session_id, model = %model, "Interview session started");
        self.stop_batch().await;

        let outcome = self.ask(&cancel, OPENING_PROMPT, model, &[]).await?;
        let failed = outcome.is_failed();
        let reply = outcome.into_text();

        let mut session = self.current(session_id).await?;
        let step = session.advance()?;
        if failed {
            session.failed_steps += 1;
        }
        session.push_exchange(OPENING_PROMPT, reply.clone());

        Ok(StepReply {
            response: reply,
            step,
            user_prompt: Some(NICHE_USER_PROMPT.to_string()),
            status: session.status.clone(),
            progress: None,
        })
    }

    /// Record the target niche. Only valid while awaiting the niche.
    pub async fn submit_niche(&self, niche: &str) -> Result<StepReply, InterviewError> {
        let _intake = self.intake.lock().await;
        let ctx = self.intake_context(InterviewStep::AwaitingNiche).await?;

        let prompt = niche_prompt(niche.trim());
        let outcome = self.ask(&ctx.cancel, &prompt, ctx.model, &ctx.history).await?;
        let failed = outcome.is_failed();
        let reply = outcome.into_text();

        let mut session = self.current(ctx.session_id).await?;
        let step = session.advance()?;
        if failed {
            session.failed_steps += 1;
        }
        session.push_exchange(prompt, reply.clone());
        info!(session_id = %session.id, step = %step, "Niche recorded");

        Ok(StepReply {
            response: reply,
            step,
            user_prompt: Some(OFFER_USER_PROMPT.to_string()),
            status: session.status.clone(),
            progress: None,
        })
    }

    /// Record the offer context and launch the scripted batch.
    ///
    /// Returns as soon as the batch is spawned; the caller polls
    /// [`InterviewManager::progress`] from then on.
    pub async fn submit_offer(&self, offer: &str) -> Result<StepReply, InterviewError> {
        let _intake = self.intake.lock().await;
        let ctx = self.intake_context(InterviewStep::AwaitingOffer).await?;

        let prompt = offer_prompt(offer.trim());
        let outcome = self.ask(&ctx.cancel, &prompt, ctx.model, &ctx.history).await?;
        let failed = outcome.is_failed();
        let reply = outcome.into_text();

        let run_cancel = {
            let mut session = self.current(ctx.session_id).await?;
            session.advance()?;
            if failed {
                session.failed_steps += 1;
            }
            session.push_exchange(prompt, reply);
            session.begin_batch();
            session.status = STATUS_ANALYSIS.to_string();
            session.cancel.child_token()
        };

        let runner = BatchRunner::new(
            self.chat.clone(),
            Arc::clone(&self.session),
            ctx.session_id,
            ctx.model,
            self.config.step_delay,
            self.config.progress_mode,
            run_cancel,
        );
        let mut run = self.run.lock().await;
        if let Some(previous) = run.take() {
            warn!(previous = %previous.session_id(), "Replacing a batch handle that was still stored");
            previous.cancel_and_wait().await;
        }
        *run = Some(runner.spawn());
        info!(session_id = %ctx.session_id, "Offer recorded, scripted batch launched");

        Ok(StepReply {
            response: BATCH_ACK.to_string(),
            step: InterviewStep::Running,
            user_prompt: None,
            status: STATUS_ANALYSIS.to_string(),
            progress: Some(0),
        })
    }

    /// Dispatch user input to whichever intake step the session is at.
    ///
    /// When `expected` is given it must match the current step.
    pub async fn submit_step(
        &self,
        expected: Option<InterviewStep>,
        input: &str,
    ) -> Result<StepReply, InterviewError> {
        let actual = self.session.read().await.step;
        if expected.is_some_and(|e| e != actual) {
            return Err(InterviewError::InvalidStep { actual });
        }
        match actual {
            InterviewStep::AwaitingNiche => self.submit_niche(input).await,
            InterviewStep::AwaitingOffer => self.submit_offer(input).await,
            other => Err(InterviewError::InvalidStep { actual: other }),
        }
    }

    pub async fn progress(&self) -> ProgressSnapshot {
        self.session.read().await.snapshot()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.session.read().await.history.clone()
    }

    pub async fn final_document(&self) -> Result<String, InterviewError> {
        let session = self.session.read().await;
        match (&session.step, &session.final_document) {
            (InterviewStep::Complete, Some(document)) => Ok(document.clone()),
            _ => Err(InterviewError::NotReady),
        }
    }

    /// The compiled document as a file. Also written to the export directory
    /// when one is configured.
    pub async fn download_document(&self) -> Result<DocumentDownload, InterviewError> {
        let document = self.final_document().await?;

        if let Some(ref dir) = self.config.export_dir {
            let path = dir.join(DOCUMENT_FILENAME);
            let export_err = |source: std::io::Error| InterviewError::Export {
                path: path.display().to_string(),
                source,
            };
            tokio::fs::create_dir_all(dir).await.map_err(export_err)?;
            tokio::fs::write(&path, document.as_bytes())
                .await
                .map_err(export_err)?;
            info!(path = %path.display(), "Strategy document exported");
        }

        Ok(DocumentDownload {
            filename: DOCUMENT_FILENAME.to_string(),
            bytes: document.into_bytes(),
        })
    }

    /// Cancel pending calls and any running batch, then wait for the batch
    /// to exit.
    pub async fn shutdown(&self) {
        self.session.read().await.cancel.cancel();
        self.stop_batch().await;
    }

    async fn stop_batch(&self) {
        let handle = self.run.lock().await.take();
        if let Some(handle) = handle {
            let session_id = handle.session_id();
            if !handle.is_finished() {
                info!(session_id = %session_id, "Cancelling running batch");
            }
            handle.cancel_and_wait().await;
            let mut session = self.session.write().await;
            if session.id == session_id {
                session.is_processing = false;
            }
        }
    }

    /// Ask the model unless the session is replaced first.
    async fn ask(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        model: ChatModel,
        history: &[ChatMessage],
    ) -> Result<ChatOutcome, InterviewError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(InterviewError::Superseded),
            outcome = self.chat.ask(prompt, model, history) => Ok(outcome),
        }
    }

    /// Write access to the session, provided it is still `session_id`.
    async fn current(
        &self,
        session_id: Uuid,
    ) -> Result<RwLockWriteGuard<'_, Session>, InterviewError> {
        let session = self.session.write().await;
        if session.id != session_id {
            info!(session_id = %session_id, "Session replaced while waiting on the model");
            return Err(InterviewError::Superseded);
        }
        Ok(session)
    }

    /// Check the step and copy out what an intake call needs.
    async fn intake_context(&self, expected: InterviewStep) -> Result<IntakeContext, InterviewError> {
        let session = self.session.read().await;
        if session.step != expected {
            warn!(expected = %expected, actual = %session.step, "Input submitted out of sequence");
            return Err(InterviewError::InvalidStep {
                actual: session.step,
            });
        }
        Ok(IntakeContext {
            session_id: session.id,
            model: session.model,
            history: session.history.clone(),
            cancel: session.cancel.clone(),
        })
    }
}
