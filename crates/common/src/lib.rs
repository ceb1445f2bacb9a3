// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between Palaver clients and the hub.
//! This module defines the WebSocket protocol messages and supporting types.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, as assigned by the server.
pub type TimestampMs = i64;

/// Messages sent from client to hub.
///
/// Every request that expects an acknowledgment is answered with an
/// [`ServerMessage::Ack`] naming the request event. `leaveRoom` is
/// fire-and-forget and produces no ack.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Create a new room and enter it as its first member
    /// # Fields
    /// * `room_id` - Operator-chosen room identifier
    /// * `max_seats` - Capacity, 1..=100
    /// * `username` - Display name of the creator
    /// * `is_public` - Whether the room is listed in the public directory
    /// * `password` - Required for private rooms, 4..=50 chars after trim
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        room_id: String,
        #[serde(default)]
        max_seats: Option<u32>,
        username: String,
        is_public: bool,
        #[serde(default)]
        password: Option<String>,
    },
    /// Join an existing room
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        username: String,
        #[serde(default)]
        password: Option<String>,
    },
    /// Send a chat message to the sender's current room
    #[serde(rename_all = "camelCase")]
    SendMessage { room_id: String, message: String },
    /// Leave the current room (fire-and-forget, no ack)
    LeaveRoom,
    /// Enter the random-chat pool; pairs immediately if a partner is waiting
    #[serde(rename_all = "camelCase")]
    RandomJoin {
        #[serde(default)]
        username: Option<String>,
    },
    /// Skip to a new stranger: end the current pairing, then re-enqueue
    RandomNext,
    /// Leave the random-chat pool and end any active pairing
    RandomLeave,
    /// Relay a WebRTC offer to the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomOffer {
        target_connection_id: String,
        payload: serde_json::Value,
    },
    /// Relay a WebRTC answer to the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomAnswer {
        target_connection_id: String,
        payload: serde_json::Value,
    },
    /// Relay an ICE candidate to the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomIceCandidate {
        target_connection_id: String,
        payload: serde_json::Value,
    },
    /// Send a chat message to the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomSendMessage { message: String },
    /// Relay a WebRTC offer to a co-member of the sender's room
    #[serde(rename_all = "camelCase")]
    WebrtcOffer {
        room_id: String,
        target_connection_id: String,
        payload: serde_json::Value,
    },
    /// Relay a WebRTC answer to a co-member of the sender's room
    #[serde(rename_all = "camelCase")]
    WebrtcAnswer {
        room_id: String,
        target_connection_id: String,
        payload: serde_json::Value,
    },
    /// Relay an ICE candidate to a co-member of the sender's room
    #[serde(rename_all = "camelCase")]
    WebrtcIceCandidate {
        room_id: String,
        target_connection_id: String,
        payload: serde_json::Value,
    },
}

impl ClientMessage {
    /// Wire name of the request event, used in acknowledgments.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::CreateRoom { .. } => "createRoom",
            ClientMessage::JoinRoom { .. } => "joinRoom",
            ClientMessage::SendMessage { .. } => "sendMessage",
            ClientMessage::LeaveRoom => "leaveRoom",
            ClientMessage::RandomJoin { .. } => "randomJoin",
            ClientMessage::RandomNext => "randomNext",
            ClientMessage::RandomLeave => "randomLeave",
            ClientMessage::RandomOffer { .. } => "randomOffer",
            ClientMessage::RandomAnswer { .. } => "randomAnswer",
            ClientMessage::RandomIceCandidate { .. } => "randomIceCandidate",
            ClientMessage::RandomSendMessage { .. } => "randomSendMessage",
            ClientMessage::WebrtcOffer { .. } => "webrtcOffer",
            ClientMessage::WebrtcAnswer { .. } => "webrtcAnswer",
            ClientMessage::WebrtcIceCandidate { .. } => "webrtcIceCandidate",
        }
    }
}

/// Matchmaking outcome reported in the `randomJoin` acknowledgment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RandomStatus {
    /// A partner was found and both sides were notified
    Paired,
    /// No partner available yet; the connection is queued
    Searching,
}

/// Messages sent from hub to client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Acknowledgment for a client request
    #[serde(rename_all = "camelCase")]
    Ack {
        /// Wire name of the request being acknowledged
        request: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<RandomStatus>,
    },
    /// Full room snapshot, sent to a connection on create/join
    #[serde(rename_all = "camelCase")]
    RoomState {
        room_id: String,
        max_seats: u32,
        users: Vec<String>,
    },
    /// Roster delta: someone joined the room
    #[serde(rename_all = "camelCase")]
    UserJoined {
        room_id: String,
        username: String,
        users: Vec<String>,
    },
    /// Roster delta: someone left the room
    #[serde(rename_all = "camelCase")]
    UserLeft {
        room_id: String,
        username: String,
        users: Vec<String>,
    },
    /// Chat message broadcast to all room members, sender included
    #[serde(rename_all = "camelCase")]
    NewMessage {
        room_id: String,
        username: String,
        message: String,
        timestamp: TimestampMs,
    },
    /// Full public-room directory, pushed on connect and on any
    /// visibility-affecting change
    PublicRooms { rooms: Vec<RoomSummary> },
    /// The connection is queued and waiting for a random partner
    RandomWaiting,
    /// A random partner was found
    #[serde(rename_all = "camelCase")]
    RandomMatched {
        partner_id: String,
        partner_alias: String,
        /// Exactly one side of a pair is the initiator; it drives the
        /// WebRTC offer.
        initiator: bool,
    },
    /// The random-chat partner disconnected or skipped away
    RandomDisconnected,
    /// Chat message within a random pairing, delivered to both sides
    #[serde(rename_all = "camelCase")]
    RandomNewMessage {
        from_connection_id: String,
        alias: String,
        message: String,
        timestamp: TimestampMs,
    },
    /// Forwarded WebRTC offer from the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomOffer {
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// Forwarded WebRTC answer from the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomAnswer {
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// Forwarded ICE candidate from the random-chat partner
    #[serde(rename_all = "camelCase")]
    RandomIceCandidate {
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// Forwarded WebRTC offer from a room co-member
    #[serde(rename_all = "camelCase")]
    WebrtcOffer {
        room_id: String,
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// Forwarded WebRTC answer from a room co-member
    #[serde(rename_all = "camelCase")]
    WebrtcAnswer {
        room_id: String,
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// Forwarded ICE candidate from a room co-member
    #[serde(rename_all = "camelCase")]
    WebrtcIceCandidate {
        room_id: String,
        from_connection_id: String,
        payload: serde_json::Value,
    },
    /// The inbound frame could not be decoded
    #[serde(rename_all = "camelCase")]
    MalformedMessage { err_msg: String },
}

impl ServerMessage {
    /// Build a success ack for a request.
    pub fn ack_ok(request: &str) -> Self {
        ServerMessage::Ack {
            request: request.to_string(),
            success: true,
            message: None,
            status: None,
        }
    }

    /// Build a success ack carrying a matchmaking status.
    pub fn ack_status(request: &str, status: RandomStatus) -> Self {
        ServerMessage::Ack {
            request: request.to_string(),
            success: true,
            message: None,
            status: Some(status),
        }
    }

    /// Build a failure ack with an error message.
    pub fn ack_err(request: &str, message: impl Into<String>) -> Self {
        ServerMessage::Ack {
            request: request.to_string(),
            success: false,
            message: Some(message.into()),
            status: None,
        }
    }
}

/// One entry of the public-room directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub max_seats: u32,
    pub current_count: u32,
    pub created_at: TimestampMs,
}

// Verify the wire shapes the clients depend on.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_wire_shape() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"createRoom","roomId":"lobby","maxSeats":4,
                "username":"alice","isPublic":true,"password":"hunter2"}"#,
        )
        .unwrap();

        match msg {
            ClientMessage::CreateRoom {
                room_id,
                max_seats,
                username,
                is_public,
                password,
            } => {
                assert_eq!(room_id, "lobby");
                assert_eq!(max_seats, Some(4));
                assert_eq!(username, "alice");
                assert!(is_public);
                assert_eq!(password.as_deref(), Some("hunter2"));
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_optional_fields_default() {
        // password and maxSeats may be absent on the wire
        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"createRoom","roomId":"r","username":"u","isPublic":true}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::CreateRoom {
                max_seats, password, ..
            } => {
                assert_eq!(max_seats, None);
                assert_eq!(password, None);
            },
            other => panic!("wrong variant: {other:?}"),
        }

        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"randomJoin"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::RandomJoin { username: None }
        ));
    }

    #[test]
    fn test_unit_events_parse() {
        for (raw, expect) in [
            (r#"{"event":"leaveRoom"}"#, "leaveRoom"),
            (r#"{"event":"randomNext"}"#, "randomNext"),
            (r#"{"event":"randomLeave"}"#, "randomLeave"),
        ] {
            let msg: ClientMessage = serde_json::from_str(raw).unwrap();
            assert_eq!(msg.event_name(), expect);
        }
    }

    #[test]
    fn test_ack_serialization() {
        let ack = ServerMessage::ack_err("joinRoom", "room is full");
        let json: serde_json::Value =
            serde_json::to_value(&ack).unwrap();
        assert_eq!(json["event"], "ack");
        assert_eq!(json["request"], "joinRoom");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "room is full");
        // absent optionals must not appear on the wire
        assert!(json.get("status").is_none());

        let ack = ServerMessage::ack_status("randomJoin", RandomStatus::Searching);
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["status"], "searching");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_matched_serialization() {
        let msg = ServerMessage::RandomMatched {
            partner_id: "abc".to_string(),
            partner_alias: "stranger".to_string(),
            initiator: true,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "randomMatched");
        assert_eq!(json["partnerId"], "abc");
        assert_eq!(json["partnerAlias"], "stranger");
        assert_eq!(json["initiator"], true);
    }

    #[test]
    fn test_signal_payload_roundtrip() {
        // payloads are opaque; the server must carry them verbatim
        let payload = serde_json::json!({"type":"offer","sdp":"v=0\r\n..."});
        let msg: ClientMessage = serde_json::from_str(&format!(
            r#"{{"event":"webrtcOffer","roomId":"r","targetConnectionId":"t","payload":{payload}}}"#
        ))
        .unwrap();
        match msg {
            ClientMessage::WebrtcOffer { payload: p, .. } => assert_eq!(p, payload),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_room_summary_wire_fields() {
        let summary = RoomSummary {
            room_id: "lobby".to_string(),
            max_seats: 8,
            current_count: 3,
            created_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["roomId"], "lobby");
        assert_eq!(json["maxSeats"], 8);
        assert_eq!(json["currentCount"], 3);
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
    }
}
