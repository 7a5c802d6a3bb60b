//! Sage core types - the conversation data model shared by every crate.

pub mod conversation;

pub use conversation::{ConversationLog, ConversationTurn, Role};
