use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single turn in a conversation. Immutable once appended to a log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl ConversationTurn {
    /// Create a user turn with the given timestamp
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            timestamp,
            text: text.into(),
        }
    }

    /// Create an assistant turn with the given timestamp
    pub fn assistant(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            timestamp,
            text: text.into(),
        }
    }
}

/// Per-session ordered log of conversation turns.
///
/// Append-only: turns are never rewritten, reordered, or removed while the
/// session lives. Insertion order is the context window order fed to the
/// generation backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the log
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// All turns in append order
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns in the log
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log has no turns yet
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the log as a `role: text` block for prompt construction.
    ///
    /// `max_turns` caps the history to the most recent turns; 0 means
    /// unlimited.
    pub fn render(&self, max_turns: usize) -> String {
        let turns: &[ConversationTurn] = if max_turns > 0 && self.turns.len() > max_turns {
            &self.turns[self.turns.len() - max_turns..]
        } else {
            &self.turns
        };

        turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_log_preserves_append_order() {
        let mut log = ConversationLog::new();
        let now = Utc::now();
        log.push(ConversationTurn::user("q1", now));
        log.push(ConversationTurn::assistant("a1", now));
        log.push(ConversationTurn::user("q2", now));
        log.push(ConversationTurn::assistant("a2", now));

        let roles: Vec<Role> = log.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(log.turns()[2].text, "q2");
    }

    #[test]
    fn test_render_full_history() {
        let mut log = ConversationLog::new();
        let now = Utc::now();
        log.push(ConversationTurn::user("hello", now));
        log.push(ConversationTurn::assistant("hi there", now));

        assert_eq!(log.render(0), "user: hello\nassistant: hi there");
    }

    #[test]
    fn test_render_caps_to_most_recent() {
        let mut log = ConversationLog::new();
        let now = Utc::now();
        for i in 0..5 {
            log.push(ConversationTurn::user(format!("q{}", i), now));
        }

        let rendered = log.render(2);
        assert_eq!(rendered, "user: q3\nuser: q4");
    }
}
