// ==============
// crates/hub-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_DELETED: &str = "room.deleted";
pub const ROOM_ACTIVE: &str = "room.active";
pub const ROOM_MESSAGES: &str = "room.messages";
pub const RANDOM_MATCHED: &str = "random.matched";
pub const RANDOM_WAITING: &str = "random.waiting";
pub const RANDOM_MESSAGES: &str = "random.messages";
pub const RELAY_FORWARDED: &str = "relay.forwarded";
pub const RELAY_DENIED: &str = "relay.denied";
