//! Sage agent - retrieval-augmented answer orchestration.
//!
//! One operation: take a session's conversation log and a fresh query,
//! fetch the best-matching context passage, generate an answer conditioned
//! on passage + history, and record both turns. Each session owns one
//! agent call at a time; the log is never touched by anything else.

mod agent;
mod prompt;

pub use agent::{AgentError, RagAgent};
pub use prompt::build_prompt;
