//! Chat calls made on behalf of the interview.
//!
//! Upstream failures never propagate from here: they come back as
//! [`ChatOutcome::Failed`] and end up in the conversation as ordinary text.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};

use super::model::ChatModel;

/// Result of one chat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Reply(String),
    Failed(String),
}

impl ChatOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Text stored in the history for this outcome.
    pub fn into_text(self) -> String {
        match self {
            Self::Reply(text) => text,
            Self::Failed(reason) => format!("Error: {reason}"),
        }
    }
}

/// Sends `history + [prompt]` to the provider with the session's model.
#[derive(Clone)]
pub struct ChatClient {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl ChatClient {
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    pub async fn ask(&self, prompt: &str, model: ChatModel, history: &[ChatMessage]) -> ChatOutcome {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_model(model.as_str())
            .with_temperature(self.temperature);

        match self.llm.complete(request).await {
            Ok(response) => {
                debug!(
                    model = %model,
                    response_id = ?response.response_id,
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    finish_reason = ?response.finish_reason,
                    "Chat completion received"
                );
                if response.finish_reason == FinishReason::Length {
                    warn!(model = %model, "Reply was cut off at the token limit");
                }
                ChatOutcome::Reply(response.content)
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Chat completion failed, keeping error text as reply");
                ChatOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::interview::testing::ScriptedLlm;
    use crate::llm::{CompletionResponse, Role};

    struct TruncatingLlm;

    #[async_trait]
    impl LlmProvider for TruncatingLlm {
        fn model_name(&self) -> &str {
            "truncating"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: "partial answ".to_string(),
                input_tokens: 900,
                output_tokens: 4096,
                finish_reason: FinishReason::Length,
                response_id: Some("chatcmpl-cut".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn ask_appends_prompt_to_history() {
        let llm = ScriptedLlm::new();
        let client = ChatClient::new(llm.clone(), 0.7);
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];

        let outcome = client.ask("c", ChatModel::Gpt4Turbo, &history).await;
        assert_eq!(outcome, ChatOutcome::Reply("reply 1".to_string()));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model.as_deref(), Some("gpt-4-turbo"));
        assert_eq!(calls[0].temperature, Some(0.7));
        assert_eq!(calls[0].messages.len(), 3);
        assert_eq!(calls[0].messages[2].role, Role::User);
        assert_eq!(calls[0].messages[2].content, "c");
    }

    #[tokio::test]
    async fn failures_become_error_text() {
        let llm = ScriptedLlm::new().failing_on(1);
        let client = ChatClient::new(llm, 0.7);

        let outcome = client.ask("x", ChatModel::Gpt4o, &[]).await;
        assert!(outcome.is_failed());
        let text = outcome.into_text();
        assert!(text.starts_with("Error: "), "got {text}");
        assert!(text.contains("scripted failure"));
    }

    #[tokio::test]
    async fn truncated_reply_is_kept() {
        let client = ChatClient::new(Arc::new(TruncatingLlm), 0.7);
        let outcome = client.ask("x", ChatModel::Gpt4, &[]).await;
        assert_eq!(outcome, ChatOutcome::Reply("partial answ".to_string()));
    }
}
