//! LLM integration for Market Brief.
//!
//! The interview only needs plain chat completions, so the surface is a single
//! `LlmProvider` trait with an OpenAI-compatible implementation over reqwest.

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub api_base: String,
    /// Default model; interview sessions override it per request.
    pub model: String,
    pub timeout: Option<Duration>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(
        config.api_key.clone(),
        config.api_base.clone(),
        config.model.clone(),
        config.timeout,
    )?;
    tracing::info!(api_base = %config.api_base, "Using OpenAI (default model: {})", config.model);
    Ok(Arc::new(provider))
}
