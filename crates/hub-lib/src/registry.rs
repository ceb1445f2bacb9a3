// ============================
// crates/hub-lib/src/registry.rs
// ============================
//! Connection registry: per-connection session data.
//!
//! The registry is the single owner of session state. Entries are created
//! when the transport hands the hub a new connection and destroyed on
//! disconnect; room and matchmaking operations mutate the bound fields.

use std::collections::HashMap;

/// Opaque connection identifier assigned by the transport.
pub type ConnectionId = String;

/// Volatile session data for one live connection.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Display name, bound while the connection is a room member
    pub username: Option<String>,
    /// Current room, bound while the connection is a room member
    pub room_id: Option<String>,
    /// Alias used in random chat, bound while in the matchmaking pool
    pub random_alias: Option<String>,
}

/// Map of live connections to their sessions.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<ConnectionId, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected client with an empty session.
    pub fn insert(&mut self, conn_id: &str) {
        self.sessions.insert(conn_id.to_string(), Session::default());
    }

    /// Remove a connection, returning its final session state.
    pub fn remove(&mut self, conn_id: &str) -> Option<Session> {
        self.sessions.remove(conn_id)
    }

    pub fn contains(&self, conn_id: &str) -> bool {
        self.sessions.contains_key(conn_id)
    }

    pub fn get(&self, conn_id: &str) -> Option<&Session> {
        self.sessions.get(conn_id)
    }

    pub fn get_mut(&mut self, conn_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(conn_id)
    }

    /// Bind room membership fields on a session.
    pub fn bind_room(&mut self, conn_id: &str, room_id: &str, username: &str) {
        if let Some(session) = self.sessions.get_mut(conn_id) {
            session.room_id = Some(room_id.to_string());
            session.username = Some(username.to_string());
        }
    }

    /// Clear room membership fields, returning the previous binding.
    pub fn clear_room(&mut self, conn_id: &str) -> Option<(String, String)> {
        let session = self.sessions.get_mut(conn_id)?;
        let room_id = session.room_id.take()?;
        let username = session.username.take().unwrap_or_default();
        Some((room_id, username))
    }

    pub fn username_of(&self, conn_id: &str) -> Option<&str> {
        self.sessions.get(conn_id)?.username.as_deref()
    }

    pub fn alias_of(&self, conn_id: &str) -> Option<&str> {
        self.sessions.get(conn_id)?.random_alias.as_deref()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut registry = Registry::new();
        registry.insert("c1");
        assert!(registry.contains("c1"));
        assert_eq!(registry.len(), 1);

        let session = registry.remove("c1").unwrap();
        assert!(session.room_id.is_none());
        assert!(!registry.contains("c1"));
        assert!(registry.remove("c1").is_none());
    }

    #[test]
    fn test_bind_and_clear_room() {
        let mut registry = Registry::new();
        registry.insert("c1");
        registry.bind_room("c1", "lobby", "alice");
        assert_eq!(registry.username_of("c1"), Some("alice"));
        assert_eq!(
            registry.get("c1").unwrap().room_id.as_deref(),
            Some("lobby")
        );

        let (room_id, username) = registry.clear_room("c1").unwrap();
        assert_eq!(room_id, "lobby");
        assert_eq!(username, "alice");
        // second clear is a no-op
        assert!(registry.clear_room("c1").is_none());
    }

    #[test]
    fn test_bind_unknown_connection_is_noop() {
        let mut registry = Registry::new();
        registry.bind_room("ghost", "lobby", "alice");
        assert!(registry.get("ghost").is_none());
    }
}
