// ============================
// crates/hub-lib/src/rooms.rs
// ============================
//! Room store: room records keyed by operator-chosen id.
//!
//! Membership is derived from the [`MembershipIndex`], never stored on the
//! room record. A room with zero members is deleted immediately by the hub,
//! so every stored room has at least one member; a deleted id may be reused
//! by a later create.

use crate::error::HubError;
use crate::membership::MembershipIndex;
use chrono::{DateTime, Utc};
use palaver_common::RoomSummary;
use std::collections::HashMap;

/// One room record. Present iff the room has at least one member.
#[derive(Debug, Clone)]
pub struct Room {
    pub max_seats: u32,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
    /// Normalized plaintext password; present and non-empty iff private.
    pub password: Option<String>,
}

#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<String, Room>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new room record. Fails if the id is already taken.
    pub fn create(
        &mut self,
        room_id: &str,
        max_seats: u32,
        is_public: bool,
        password: Option<String>,
    ) -> Result<(), HubError> {
        if self.rooms.contains_key(room_id) {
            return Err(HubError::Conflict(format!(
                "room '{room_id}' already exists"
            )));
        }
        self.rooms.insert(
            room_id.to_string(),
            Room {
                max_seats,
                created_at: Utc::now(),
                is_public,
                password,
            },
        );
        Ok(())
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Drop a room record. Called by the hub when the last member leaves.
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    /// Check a join attempt against the room's password and capacity.
    ///
    /// Password comparison is exact string equality after trimming the
    /// candidate; capacity is checked against the live membership count.
    pub fn check_join(
        &self,
        room_id: &str,
        password: Option<&str>,
        current_count: usize,
    ) -> Result<&Room, HubError> {
        let room = self.rooms.get(room_id).ok_or_else(|| {
            HubError::NotFound(format!("room '{room_id}' not found"))
        })?;
        if let Some(expected) = &room.password {
            let supplied = password.map(str::trim).unwrap_or("");
            if supplied != expected {
                return Err(HubError::Unauthorized(
                    "incorrect room password".to_string(),
                ));
            }
        }
        if current_count >= room.max_seats as usize {
            return Err(HubError::Full(format!("room '{room_id}' is full")));
        }
        Ok(room)
    }

    /// Snapshot of the public-room directory, sorted by creation time
    /// descending. Recomputed per call so counts stay consistent with
    /// live membership.
    pub fn public_rooms(&self, membership: &MembershipIndex) -> Vec<RoomSummary> {
        let mut rooms: Vec<(&String, &Room)> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.is_public)
            .collect();
        rooms.sort_by(|(id_a, a), (id_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| id_a.cmp(id_b))
        });
        rooms
            .into_iter()
            .map(|(room_id, room)| RoomSummary {
                room_id: room_id.clone(),
                max_seats: room.max_seats,
                current_count: membership.count(room_id) as u32,
                created_at: room.created_at.timestamp_millis(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(rooms: &[(&str, u32, bool, Option<&str>)]) -> RoomStore {
        let mut store = RoomStore::new();
        for (id, seats, public, password) in rooms {
            store
                .create(id, *seats, *public, password.map(String::from))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let mut store = store_with(&[("lobby", 4, true, None)]);
        let err = store.create("lobby", 2, true, None).unwrap_err();
        assert!(matches!(err, HubError::Conflict(_)));
    }

    #[test]
    fn test_removed_id_can_be_reused() {
        let mut store = store_with(&[("lobby", 4, true, None)]);
        store.remove("lobby").unwrap();
        assert!(store.create("lobby", 2, false, Some("pass".into())).is_ok());
    }

    #[test]
    fn test_check_join_password() {
        let store = store_with(&[("secret", 4, false, Some("pass1"))]);

        let err = store.check_join("secret", Some("wrong"), 0).unwrap_err();
        assert!(matches!(err, HubError::Unauthorized(_)));

        // comparison trims the candidate
        assert!(store.check_join("secret", Some(" pass1 "), 0).is_ok());
        assert!(store.check_join("secret", None, 0).is_err());
    }

    #[test]
    fn test_check_join_capacity() {
        let store = store_with(&[("lobby", 2, true, None)]);
        assert!(store.check_join("lobby", None, 1).is_ok());
        let err = store.check_join("lobby", None, 2).unwrap_err();
        assert!(matches!(err, HubError::Full(_)));
    }

    #[test]
    fn test_check_join_missing_room() {
        let store = RoomStore::new();
        let err = store.check_join("ghost", None, 0).unwrap_err();
        assert!(matches!(err, HubError::NotFound(_)));
    }

    #[test]
    fn test_public_rooms_excludes_private() {
        let store = store_with(&[
            ("open", 4, true, None),
            ("hidden", 4, false, Some("pass1")),
        ]);
        let mut membership = MembershipIndex::new();
        membership.add("open", "a");
        membership.add("hidden", "b");

        let directory = store.public_rooms(&membership);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory[0].room_id, "open");
        assert_eq!(directory[0].current_count, 1);
    }
}
