//! Interview state machine: which step the session is at and everything the
//! batch runner has produced so far.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::InterviewError;
use crate::llm::ChatMessage;

use super::model::{ChatModel, ProgressSnapshot};
use super::prompts::SCRIPT;

/// The steps of an interview.
///
/// Progresses linearly: NotStarted → AwaitingNiche → AwaitingOffer →
/// Running → Complete. Only a new session goes back to the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStep {
    #[default]
    NotStarted,
    AwaitingNiche,
    AwaitingOffer,
    Running,
    Complete,
}

impl InterviewStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: InterviewStep) -> bool {
        use InterviewStep::*;
        matches!(
            (self, target),
            (NotStarted, AwaitingNiche)
                | (AwaitingNiche, AwaitingOffer)
                | (AwaitingOffer, Running)
                | (Running, Complete)
        )
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<InterviewStep> {
        use InterviewStep::*;
        match self {
            NotStarted => Some(AwaitingNiche),
            AwaitingNiche => Some(AwaitingOffer),
            AwaitingOffer => Some(Running),
            Running => Some(Complete),
            Complete => None,
        }
    }
}

impl std::fmt::Display for InterviewStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::AwaitingNiche => "awaiting_niche",
            Self::AwaitingOffer => "awaiting_offer",
            Self::Running => "running",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

pub const STATUS_READY: &str = "Ready to start";
pub const STATUS_STARTING: &str = "Starting...";
pub const STATUS_ANALYSIS: &str = "Starting analysis...";
pub const STATUS_FINALIZING: &str = "Finalizing document";
pub const STATUS_COMPLETE: &str = "Complete";

/// The single live interview.
///
/// `final_document` is only ever set through [`Session::complete`], which also
/// moves the step to `Complete`.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub history: Vec<ChatMessage>,
    pub step: InterviewStep,
    pub model: ChatModel,
    pub current_prompt_index: usize,
    pub progress: u8,
    pub status: String,
    pub is_processing: bool,
    pub final_document: Option<String>,
    /// Chat calls whose reply is an absorbed error.
    pub failed_steps: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Cancelled when this session is replaced; every chat call made on its
    /// behalf races it.
    pub cancel: CancellationToken,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            history: Vec::new(),
            step: InterviewStep::NotStarted,
            model: ChatModel::default(),
            current_prompt_index: 0,
            progress: 0,
            status: STATUS_READY.to_string(),
            is_processing: false,
            final_document: None,
            failed_steps: 0,
            started_at: None,
            completed_at: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl Session {
    /// A fresh session for `model`, replacing whatever came before.
    pub fn start(model: ChatModel) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            status: STATUS_STARTING.to_string(),
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Swap in `next`, cancelling everything still running for this session.
    pub fn replace(&mut self, next: Session) {
        self.cancel.cancel();
        *self = next;
    }

    /// Advance to the next step. Fails at the terminal step.
    pub fn advance(&mut self) -> Result<InterviewStep, InterviewError> {
        let next = self
            .step
            .next()
            .filter(|next| self.step.can_transition_to(*next))
            .ok_or(InterviewError::InvalidStep { actual: self.step })?;
        self.step = next;
        Ok(next)
    }

    /// Append a user prompt and the assistant's reply.
    pub fn push_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(reply));
    }

    /// Raise progress; lower values are ignored.
    pub fn raise_progress(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// Mark the batch as running. Used both by the offer intake and by the
    /// runner itself.
    pub fn begin_batch(&mut self) {
        self.step = InterviewStep::Running;
        self.progress = 0;
        self.is_processing = true;
    }

    /// Store the compiled document and finish the run.
    pub fn complete(&mut self, document: String) {
        self.final_document = Some(document);
        self.step = InterviewStep::Complete;
        self.progress = 100;
        self.status = STATUS_COMPLETE.to_string();
        self.is_processing = false;
        self.completed_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: self.id,
            step: self.step,
            progress: self.progress,
            status: self.status.clone(),
            current_prompt_index: self.current_prompt_index,
            total_prompts: SCRIPT.len(),
            complete: self.step == InterviewStep::Complete,
            is_processing: self.is_processing,
            failed_steps: self.failed_steps,
            model: self.model,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}
