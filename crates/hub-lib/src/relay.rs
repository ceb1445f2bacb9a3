// ============================
// crates/hub-lib/src/relay.rs
// ============================
//! Signaling relay authorization.
//!
//! Negotiation payloads (offer / answer / ICE candidate) are forwarded
//! verbatim between exactly the two parties entitled to exchange them:
//! co-members of the same room, or the two sides of an active random
//! pairing. The checks here are the security contract that keeps a
//! connection from injecting signaling traffic into a session it is not
//! part of; the payload itself is never inspected.

use crate::error::HubError;
use crate::matchmaking::Matchmaking;
use crate::membership::MembershipIndex;
use crate::registry::Registry;
use palaver_common::ServerMessage;

/// Kind of negotiation payload being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Authorize a room-context signal: the sender's bound room must match the
/// stated room, and the target must currently be a member of that room.
pub fn authorize_room_signal(
    registry: &Registry,
    membership: &MembershipIndex,
    sender: &str,
    room_id: &str,
    target: &str,
) -> Result<(), HubError> {
    let bound = registry
        .get(sender)
        .and_then(|session| session.room_id.as_deref());
    if bound != Some(room_id) {
        return Err(HubError::Unauthorized(
            "not a member of the stated room".to_string(),
        ));
    }
    if !membership.contains(room_id, target) {
        return Err(HubError::Unauthorized(
            "target is not a member of the stated room".to_string(),
        ));
    }
    Ok(())
}

/// Authorize a random-context signal: sender and target must be each
/// other's current partner in the pairing table.
pub fn authorize_random_signal(
    matchmaking: &Matchmaking,
    sender: &str,
    target: &str,
) -> Result<(), HubError> {
    // The table is symmetric, so one direction suffices.
    if matchmaking.partner_of(sender) != Some(target) {
        return Err(HubError::Unauthorized(
            "target is not the current random partner".to_string(),
        ));
    }
    Ok(())
}

/// Build the mirrored forward event for a room-context signal.
pub fn room_forward(
    kind: SignalKind,
    room_id: &str,
    sender: &str,
    payload: serde_json::Value,
) -> ServerMessage {
    let room_id = room_id.to_string();
    let from_connection_id = sender.to_string();
    match kind {
        SignalKind::Offer => ServerMessage::WebrtcOffer {
            room_id,
            from_connection_id,
            payload,
        },
        SignalKind::Answer => ServerMessage::WebrtcAnswer {
            room_id,
            from_connection_id,
            payload,
        },
        SignalKind::IceCandidate => ServerMessage::WebrtcIceCandidate {
            room_id,
            from_connection_id,
            payload,
        },
    }
}

/// Build the mirrored forward event for a random-context signal.
pub fn random_forward(
    kind: SignalKind,
    sender: &str,
    payload: serde_json::Value,
) -> ServerMessage {
    let from_connection_id = sender.to_string();
    match kind {
        SignalKind::Offer => ServerMessage::RandomOffer {
            from_connection_id,
            payload,
        },
        SignalKind::Answer => ServerMessage::RandomAnswer {
            from_connection_id,
            payload,
        },
        SignalKind::IceCandidate => ServerMessage::RandomIceCandidate {
            from_connection_id,
            payload,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_setup() -> (Registry, MembershipIndex) {
        let mut registry = Registry::new();
        let mut membership = MembershipIndex::new();
        for conn in ["a", "b", "c"] {
            registry.insert(conn);
        }
        registry.bind_room("a", "lobby", "alice");
        registry.bind_room("b", "lobby", "bob");
        membership.add("lobby", "a");
        membership.add("lobby", "b");
        (registry, membership)
    }

    #[test]
    fn test_room_signal_between_members() {
        let (registry, membership) = room_setup();
        assert!(
            authorize_room_signal(&registry, &membership, "a", "lobby", "b").is_ok()
        );
    }

    #[test]
    fn test_room_signal_rejects_outsider_sender() {
        let (registry, membership) = room_setup();
        // c is connected but never joined the room
        let err = authorize_room_signal(&registry, &membership, "c", "lobby", "b")
            .unwrap_err();
        assert!(matches!(err, HubError::Unauthorized(_)));
    }

    #[test]
    fn test_room_signal_rejects_outsider_target() {
        let (registry, membership) = room_setup();
        let err = authorize_room_signal(&registry, &membership, "a", "lobby", "c")
            .unwrap_err();
        assert!(matches!(err, HubError::Unauthorized(_)));
    }

    #[test]
    fn test_room_signal_rejects_mismatched_room() {
        let (mut registry, mut membership) = room_setup();
        registry.insert("d");
        registry.bind_room("d", "other", "dave");
        membership.add("other", "d");
        // d is a member, just not of the stated room
        let err = authorize_room_signal(&registry, &membership, "d", "lobby", "b")
            .unwrap_err();
        assert!(matches!(err, HubError::Unauthorized(_)));
    }

    #[test]
    fn test_random_signal_requires_active_pairing() {
        let mut mm = Matchmaking::new();
        mm.enqueue("a", |_| true);
        mm.enqueue("b", |_| true);

        assert!(authorize_random_signal(&mm, "a", "b").is_ok());
        assert!(authorize_random_signal(&mm, "b", "a").is_ok());
        assert!(authorize_random_signal(&mm, "a", "c").is_err());
        assert!(authorize_random_signal(&mm, "c", "a").is_err());

        mm.end_session("a");
        assert!(authorize_random_signal(&mm, "a", "b").is_err());
    }

    #[test]
    fn test_forward_carries_sender_and_payload() {
        let payload = serde_json::json!({"candidate":"..."});
        let msg = room_forward(SignalKind::IceCandidate, "lobby", "a", payload.clone());
        match msg {
            ServerMessage::WebrtcIceCandidate {
                room_id,
                from_connection_id,
                payload: p,
            } => {
                assert_eq!(room_id, "lobby");
                assert_eq!(from_connection_id, "a");
                assert_eq!(p, payload);
            },
            other => panic!("wrong variant: {other:?}"),
        }

        let msg = random_forward(SignalKind::Offer, "b", payload.clone());
        assert!(matches!(msg, ServerMessage::RandomOffer { .. }));
    }
}
