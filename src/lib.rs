//! Market Brief — guided marketing research interview over a chat model.

pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
