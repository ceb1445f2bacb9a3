// ============================
// crates/hub-lib/src/membership.rs
// ============================
//! Membership index: which connections belong to which room.
//!
//! Owned by the hub rather than derived from any transport grouping
//! primitive, so rosters and broadcast targets can be computed without a
//! live connection. Insertion order is preserved for roster displays.

use crate::registry::ConnectionId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MembershipIndex {
    by_room: HashMap<String, Vec<ConnectionId>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room. Duplicate adds are ignored; a
    /// connection is a member of at most one room, which the hub enforces
    /// through the session binding.
    pub fn add(&mut self, room_id: &str, conn_id: &str) {
        let members = self.by_room.entry(room_id.to_string()).or_default();
        if !members.iter().any(|m| m == conn_id) {
            members.push(conn_id.to_string());
        }
    }

    /// Remove a connection from a room. Returns true if it was a member.
    /// The entry for an emptied room is dropped so no empty rooms linger
    /// in the index.
    pub fn remove(&mut self, room_id: &str, conn_id: &str) -> bool {
        let Some(members) = self.by_room.get_mut(room_id) else {
            return false;
        };
        let before = members.len();
        members.retain(|m| m != conn_id);
        let removed = members.len() < before;
        if members.is_empty() {
            self.by_room.remove(room_id);
        }
        removed
    }

    pub fn contains(&self, room_id: &str, conn_id: &str) -> bool {
        self.by_room
            .get(room_id)
            .is_some_and(|members| members.iter().any(|m| m == conn_id))
    }

    /// Members of a room in join order.
    pub fn members(&self, room_id: &str) -> &[ConnectionId] {
        self.by_room.get(room_id).map_or(&[], Vec::as_slice)
    }

    pub fn count(&self, room_id: &str) -> usize {
        self.by_room.get(room_id).map_or(0, Vec::len)
    }
}
