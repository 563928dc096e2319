//! Models and reply types for the interview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::InterviewStep;

/// File name offered for the compiled document.
pub const DOCUMENT_FILENAME: &str = "marketing_strategy.txt";

/// Chat models a session may run on. The first one is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ChatModel {
    pub const ALL: [ChatModel; 4] = [
        ChatModel::Gpt4o,
        ChatModel::Gpt4Turbo,
        ChatModel::Gpt4,
        ChatModel::Gpt35Turbo,
    ];

    /// API identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4Turbo => "gpt-4-turbo",
            Self::Gpt4 => "gpt-4",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    /// Human-readable name for selectors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gpt4o => "GPT-4o",
            Self::Gpt4Turbo => "GPT-4 Turbo",
            Self::Gpt4 => "GPT-4",
            Self::Gpt35Turbo => "GPT-3.5 Turbo",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id.trim())
    }
}

impl std::fmt::Display for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller gets back from an intake call.
#[derive(Debug, Clone, Serialize)]
pub struct StepReply {
    /// Assistant reply, or the acknowledgement once the batch is launched.
    pub response: String,
    pub step: InterviewStep,
    /// Prompt to show the user for the next input, if one is expected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// Read-only view of the session for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub session_id: Uuid,
    pub step: InterviewStep,
    pub progress: u8,
    pub status: String,
    pub current_prompt_index: usize,
    pub total_prompts: usize,
    pub complete: bool,
    pub is_processing: bool,
    pub failed_steps: u32,
    pub model: ChatModel,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A finished document ready to be sent as a file.
#[derive(Debug, Clone)]
pub struct DocumentDownload {
    pub filename: String,
    pub bytes: Vec<u8>,
}
