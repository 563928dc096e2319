//! Stub provider for interview unit tests (no real API calls).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

/// Replies `"reply N"` to the N-th call (1-based) and records every request.
pub(crate) struct ScriptedLlm {
    calls: Mutex<Vec<CompletionRequest>>,
    failures: Mutex<HashSet<usize>>,
    stalls: Mutex<HashSet<usize>>,
    delay: Mutex<Duration>,
}

impl ScriptedLlm {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            stalls: Mutex::new(HashSet::new()),
            delay: Mutex::new(Duration::ZERO),
        })
    }

    /// Make the `call`-th request fail.
    pub(crate) fn failing_on(self: Arc<Self>, call: usize) -> Arc<Self> {
        self.failures.lock().unwrap().insert(call);
        self
    }

    /// Make the `call`-th request never return.
    pub(crate) fn stalling_on(self: Arc<Self>, call: usize) -> Arc<Self> {
        self.stalls.lock().unwrap().insert(call);
        self
    }

    /// Sleep this long inside every call.
    pub(crate) fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request);
            calls.len()
        };

        let stalled = self.stalls.lock().unwrap().contains(&n);
        if stalled {
            std::future::pending::<()>().await;
        }

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failures.lock().unwrap().contains(&n) {
            return Err(LlmError::RequestFailed {
                provider: "scripted".to_string(),
                reason: format!("scripted failure on call {n}"),
            });
        }

        Ok(CompletionResponse {
            content: format!("reply {n}"),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}
