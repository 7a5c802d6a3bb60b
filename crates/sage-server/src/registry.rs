//! Session registry
//!
//! Tracks the set of currently-open client connections and supports
//! broadcast and individual delivery. The registry holds only identity and
//! an outbound channel; conversation state stays inside each connection's
//! task.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Handle to an open session, valid only while its connection is open
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Client identity, supplied by the transport at connect time
    pub identity: String,
    /// Session creation time
    pub connected_at: DateTime<Utc>,
    /// Channel delivering outbound text to the connection task
    sender: mpsc::UnboundedSender<String>,
}

impl SessionHandle {
    pub fn new(identity: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            identity: identity.into(),
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queue a text message for delivery to this session
    pub fn send(&self, message: impl Into<String>) -> Result<(), RegistryError> {
        self.sender
            .send(message.into())
            .map_err(|_| RegistryError::Closed)
    }

    /// Whether two handles belong to the same connection
    pub fn same_channel(&self, other: &SessionHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// Concurrency-safe set of open sessions keyed by client identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `identity`. A handle left behind by a stale
    /// connection with the same identity is replaced.
    pub fn register(
        &self,
        identity: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
    ) -> SessionHandle {
        let handle = SessionHandle::new(identity, sender);
        self.sessions
            .insert(handle.identity.clone(), handle.clone());
        handle
    }

    /// Remove `handle`'s session. Idempotent: removing an absent session is
    /// a no-op. Handle-aware: a stale connection tearing down after a
    /// reconnect has replaced its handle leaves the fresh session in place.
    /// Returns whether a session was actually removed.
    pub fn unregister(&self, handle: &SessionHandle) -> bool {
        self.sessions
            .remove_if(handle.identity.as_str(), |_, current| {
                current.same_channel(handle)
            })
            .is_some()
    }

    /// Best-effort delivery to the snapshot of sessions open at call time.
    /// Sessions that close concurrently may miss a broadcast in flight.
    pub fn broadcast(&self, message: &str) {
        for entry in self.sessions.iter() {
            if entry.value().send(message).is_err() {
                debug!(identity = %entry.key(), "broadcast to closed session skipped");
            }
        }
    }

    /// Deliver to a single session
    pub fn send_to(&self, identity: &str, message: &str) -> Result<(), RegistryError> {
        match self.sessions.get(identity) {
            Some(handle) => handle.send(message),
            None => Err(RegistryError::NotFound(identity.to_string())),
        }
    }

    /// Whether `identity` currently has an open session
    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    /// Number of open sessions
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("session channel closed")]
    Closed,
    #[error("session not found: {0}")]
    NotFound(String),
}
