//! Per-participant session state and storage.

use std::collections::HashMap;
use std::fmt;

use super::pending::PendingCommand;
use crate::fs::Location;

/// Chat participant identity (also the principal's identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation and authorization state for one participant.
///
/// Created on first contact, in-memory only: a restart resets every
/// session. `pending` holds at most one multi-turn command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub location: Location,
    pub pending: Option<PendingCommand>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any in-flight multi-turn command, returning what was
    /// pending. Snapshots held by the pending state go with it.
    pub fn clear_pending(&mut self) -> Option<PendingCommand> {
        self.pending.take()
    }
}

/// Session storage keyed by chat identity.
///
/// Owned by the command protocol and accessed from its single dispatch
/// loop; one inbound message is processed at a time, so no lock is
/// needed.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<ChatId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for a participant, creating it on first
    /// contact.
    pub fn get_or_create(&mut self, id: ChatId) -> &mut Session {
        self.sessions.entry(id).or_default()
    }

    /// Read-only lookup.
    pub fn get(&self, id: ChatId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new();
        assert!(!session.authenticated);
        assert!(session.location.is_root());
        assert!(session.pending.is_none());
    }

    #[test]
    fn test_get_or_create() {
        let mut store = SessionStore::new();
        assert_eq!(store.count(), 0);

        store.get_or_create(ChatId(7)).authenticated = true;
        assert_eq!(store.count(), 1);

        // Same participant maps to the same session.
        assert!(store.get_or_create(ChatId(7)).authenticated);
        assert_eq!(store.count(), 1);

        assert!(store.get(ChatId(8)).is_none());
    }

    #[test]
    fn test_clear_pending_returns_previous() {
        let mut session = Session::new();
        session.pending = Some(PendingCommand::AwaitingDeleteName);

        let previous = session.clear_pending();
        assert_eq!(previous, Some(PendingCommand::AwaitingDeleteName));
        assert!(session.pending.is_none());
        assert!(session.clear_pending().is_none());
    }

    #[test]
    fn test_chat_id_display() {
        assert_eq!(ChatId(123456789).to_string(), "123456789");
    }
}
