// ============================
// crates/hub-lib/src/matchmaking.rs
// ============================
//! Matchmaking queue and pairing table for random chat.
//!
//! The queue is a FIFO of connections waiting for a partner; the pairing
//! table is a symmetric map of currently matched partners. A connection is
//! never simultaneously queued and paired, and pairing entries are always
//! created and removed in symmetric pairs.
//!
//! Liveness of queued candidates is probed through a caller-supplied
//! closure so this module carries no transport dependency.

use crate::registry::ConnectionId;
use std::collections::{HashMap, VecDeque};

/// Result of an enqueue attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Paired with a previously waiting connection. The requester is the
    /// initiator of the pairing.
    Matched { partner: ConnectionId },
    /// No candidate available; appended to the queue tail.
    Waiting,
}

#[derive(Debug, Default)]
pub struct Matchmaking {
    queue: VecDeque<ConnectionId>,
    pairs: HashMap<ConnectionId, ConnectionId>,
}

impl Matchmaking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paired(&self, conn_id: &str) -> bool {
        self.pairs.contains_key(conn_id)
    }

    pub fn partner_of(&self, conn_id: &str) -> Option<&str> {
        self.pairs.get(conn_id).map(String::as_str)
    }

    pub fn in_queue(&self, conn_id: &str) -> bool {
        self.queue.iter().any(|c| c == conn_id)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a connection, pairing it greedily with the first eligible
    /// candidate in FIFO order.
    ///
    /// Re-entry is idempotent: the requester is removed from the queue
    /// before the scan. Candidates that fail the liveness probe are
    /// dropped from the queue, not re-enqueued. If no candidate is
    /// eligible the requester is appended to the tail.
    pub fn enqueue(
        &mut self,
        conn_id: &str,
        mut is_live: impl FnMut(&str) -> bool,
    ) -> EnqueueOutcome {
        self.queue.retain(|c| c != conn_id);

        let mut idx = 0;
        let mut found: Option<ConnectionId> = None;
        while idx < self.queue.len() {
            let candidate = self.queue[idx].clone();
            if !is_live(&candidate) {
                self.queue.remove(idx);
                continue;
            }
            if candidate != conn_id && !self.pairs.contains_key(&candidate) {
                self.queue.remove(idx);
                found = Some(candidate);
                break;
            }
            idx += 1;
        }

        match found {
            Some(partner) => {
                // Both directions set together so the table never holds a
                // one-sided mapping.
                self.pairs.insert(conn_id.to_string(), partner.clone());
                self.pairs.insert(partner.clone(), conn_id.to_string());
                EnqueueOutcome::Matched { partner }
            },
            None => {
                self.queue.push_back(conn_id.to_string());
                EnqueueOutcome::Waiting
            },
        }
    }

    /// Remove a connection from the queue and clear any active pairing,
    /// returning the former partner if one existed. Safe to call on
    /// already-cleaned-up connections.
    pub fn end_session(&mut self, conn_id: &str) -> Option<ConnectionId> {
        self.queue.retain(|c| c != conn_id);
        let partner = self.pairs.remove(conn_id)?;
        self.pairs.remove(&partner);
        Some(partner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(_: &str) -> bool {
        true
    }

    #[test]
    fn test_first_entrant_waits() {
        let mut mm = Matchmaking::new();
        assert_eq!(mm.enqueue("a", live), EnqueueOutcome::Waiting);
        assert!(mm.in_queue("a"));
        assert!(!mm.is_paired("a"));
    }

    #[test]
    fn test_pairing_is_symmetric() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", live);
        let outcome = mm.enqueue("b", live);
        assert_eq!(
            outcome,
            EnqueueOutcome::Matched {
                partner: "a".to_string()
            }
        );
        assert_eq!(mm.partner_of("a"), Some("b"));
        assert_eq!(mm.partner_of("b"), Some("a"));
        assert!(!mm.in_queue("a"));
        assert!(!mm.in_queue("b"));
    }

    #[test]
    fn test_reentry_keeps_single_queue_slot() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", live);
        mm.enqueue("a", live);
        assert_eq!(mm.queue_len(), 1);
    }

    #[test]
    fn test_greedy_fifo_order() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", live);
        mm.enqueue("b", live);
        // c pairs with the queue head, not the most recent entrant
        let outcome = mm.enqueue("c", live);
        assert_eq!(
            outcome,
            EnqueueOutcome::Matched {
                partner: "a".to_string()
            }
        );
        assert!(mm.in_queue("b"));
    }

    #[test]
    fn test_stale_entries_dropped_during_scan() {
        let mut mm = Matchmaking::new();
        mm.enqueue("dead1", live);
        mm.enqueue("dead2", live);
        mm.enqueue("alive", live);

        let outcome = mm.enqueue("x", |c| c != "dead1" && c != "dead2");
        assert_eq!(
            outcome,
            EnqueueOutcome::Matched {
                partner: "alive".to_string()
            }
        );
        // stale entries were removed, not re-enqueued
        assert_eq!(mm.queue_len(), 0);
        assert!(!mm.in_queue("dead1"));
        assert!(!mm.in_queue("dead2"));
    }

    #[test]
    fn test_all_stale_leaves_requester_waiting() {
        let mut mm = Matchmaking::new();
        mm.enqueue("dead", live);
        let outcome = mm.enqueue("x", |_| false);
        assert_eq!(outcome, EnqueueOutcome::Waiting);
        assert_eq!(mm.queue_len(), 1);
        assert!(mm.in_queue("x"));
    }

    #[test]
    fn test_end_session_clears_both_sides() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", live);
        mm.enqueue("b", live);

        assert_eq!(mm.end_session("a"), Some("b".to_string()));
        assert!(!mm.is_paired("a"));
        assert!(!mm.is_paired("b"));
        // idempotent: nothing left to clean up
        assert_eq!(mm.end_session("a"), None);
        assert_eq!(mm.end_session("b"), None);
    }

    #[test]
    fn test_end_session_dequeues_waiter() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", live);
        assert_eq!(mm.end_session("a"), None);
        assert!(!mm.in_queue("a"));
    }
}
