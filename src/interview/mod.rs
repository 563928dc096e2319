//! Marketing research interview.
//!
//! A session opens with a fixed brief to the model, collects the user's target
//! niche and offer, then runs a fixed script of research prompts in the
//! background against the growing conversation. A final call compiles
//! everything into the strategy document.

pub mod chat;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod runner;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatClient, ChatOutcome};
pub use manager::InterviewManager;
pub use model::{ChatModel, DocumentDownload, ProgressSnapshot, StepReply};
pub use routes::{InterviewRouteState, interview_routes};
pub use state::{InterviewStep, Session};
