// ============================
// crates/hub-lib/src/hub.rs
// ============================
//! The hub: state owner and event dispatcher.
//!
//! All authoritative state (registry, room store, membership index,
//! matchmaking) lives behind one coarse [`parking_lot::Mutex`], so every
//! check-then-act sequence (room absent then create, candidate unpaired
//! then paired) is applied atomically. Outbound delivery goes through
//! per-connection unbounded channels held in a [`DashMap`]; sends are
//! fire-and-forget and never block, so they are safe to issue while the
//! state lock is held. Each operation collects its outbound events into an
//! outbox and delivers them after the mutation completes.
//!
//! Everything here is volatile by design: state is lost on restart.

use crate::error::HubError;
use crate::matchmaking::{EnqueueOutcome, Matchmaking};
use crate::membership::MembershipIndex;
use crate::metrics as keys;
use crate::registry::{ConnectionId, Registry};
use crate::relay::{self, SignalKind};
use crate::rooms::RoomStore;
use crate::validation;
use chrono::Utc;
use dashmap::DashMap;
use metrics::{counter, gauge};
use palaver_common::{ClientMessage, RandomStatus, ServerMessage};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound events queued during a mutation, delivered after it.
type Outbox = Vec<(ConnectionId, ServerMessage)>;

#[derive(Default)]
struct HubState {
    registry: Registry,
    rooms: RoomStore,
    membership: MembershipIndex,
    random: Matchmaking,
}

/// State-owning coordination service, injected into the transport layer.
#[derive(Default)]
pub struct Hub {
    /// Outbound channel per live connection. Kept outside the state lock
    /// so liveness probes and delivery never contend with mutations.
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    state: Mutex<HubState>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and push the public-room directory to it.
    pub fn connect(&self, conn_id: &str, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.senders.insert(conn_id.to_string(), tx);
        let directory = {
            let mut st = self.state.lock();
            st.registry.insert(conn_id);
            st.rooms.public_rooms(&st.membership)
        };
        info!(conn_id, "connection registered");
        self.deliver(vec![(
            conn_id.to_string(),
            ServerMessage::PublicRooms { rooms: directory },
        )]);
    }

    /// Unified teardown for a closed connection: room membership, queue,
    /// pairing, and registry entry. Idempotent; a second invocation finds
    /// nothing to clean up and emits nothing.
    pub fn disconnect(&self, conn_id: &str) {
        self.senders.remove(conn_id);
        let mut outbox = Outbox::new();
        {
            let mut st = self.state.lock();
            self.leave_room_locked(&mut st, conn_id, &mut outbox);
            Self::end_random_locked(&mut st, conn_id, true, &mut outbox);
            if st.registry.remove(conn_id).is_some() {
                info!(conn_id, "connection torn down");
            }
        }
        self.deliver(outbox);
    }

    /// Route one inbound client event, returning the ack to send back (or
    /// `None` for fire-and-forget events).
    pub fn handle_message(
        &self,
        conn_id: &str,
        msg: ClientMessage,
    ) -> Option<ServerMessage> {
        let request = msg.event_name();
        let result = match msg {
            ClientMessage::CreateRoom {
                room_id,
                max_seats,
                username,
                is_public,
                password,
            } => self
                .create_room(
                    conn_id,
                    &room_id,
                    max_seats,
                    &username,
                    is_public,
                    password.as_deref(),
                )
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::JoinRoom {
                room_id,
                username,
                password,
            } => self
                .join_room(conn_id, &room_id, &username, password.as_deref())
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::SendMessage { room_id, message } => self
                .send_room_message(conn_id, &room_id, &message)
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::LeaveRoom => {
                self.leave_room(conn_id);
                return None;
            },
            ClientMessage::RandomJoin { username } => self
                .random_join(conn_id, username.as_deref())
                .map(|status| ServerMessage::ack_status(request, status)),
            ClientMessage::RandomNext => self
                .random_next(conn_id)
                .map(|_| ServerMessage::ack_ok(request)),
            ClientMessage::RandomLeave => {
                self.random_leave(conn_id);
                Ok(ServerMessage::ack_ok(request))
            },
            ClientMessage::RandomOffer {
                target_connection_id,
                payload,
            } => self
                .random_signal(conn_id, SignalKind::Offer, &target_connection_id, payload)
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::RandomAnswer {
                target_connection_id,
                payload,
            } => self
                .random_signal(conn_id, SignalKind::Answer, &target_connection_id, payload)
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::RandomIceCandidate {
                target_connection_id,
                payload,
            } => self
                .random_signal(
                    conn_id,
                    SignalKind::IceCandidate,
                    &target_connection_id,
                    payload,
                )
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::RandomSendMessage { message } => self
                .random_send_message(conn_id, &message)
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::WebrtcOffer {
                room_id,
                target_connection_id,
                payload,
            } => self
                .room_signal(
                    conn_id,
                    SignalKind::Offer,
                    &room_id,
                    &target_connection_id,
                    payload,
                )
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::WebrtcAnswer {
                room_id,
                target_connection_id,
                payload,
            } => self
                .room_signal(
                    conn_id,
                    SignalKind::Answer,
                    &room_id,
                    &target_connection_id,
                    payload,
                )
                .map(|()| ServerMessage::ack_ok(request)),
            ClientMessage::WebrtcIceCandidate {
                room_id,
                target_connection_id,
                payload,
            } => self
                .room_signal(
                    conn_id,
                    SignalKind::IceCandidate,
                    &room_id,
                    &target_connection_id,
                    payload,
                )
                .map(|()| ServerMessage::ack_ok(request)),
        };

        Some(result.unwrap_or_else(|err| {
            debug!(conn_id, request, %err, "request rejected");
            ServerMessage::ack_err(request, err.to_string())
        }))
    }

    // ---- room operations ----

    pub fn create_room(
        &self,
        conn_id: &str,
        room_id: &str,
        max_seats: Option<u32>,
        username: &str,
        is_public: bool,
        password: Option<&str>,
    ) -> Result<(), HubError> {
        let room_id = validation::room_id(room_id)?;
        let max_seats = validation::seats(max_seats)?;
        let username = validation::username(username)?;
        let password = validation::room_password(is_public, password)?;

        let mut outbox = Outbox::new();
        {
            let mut st = self.state.lock();
            if !st.registry.contains(conn_id) {
                return Err(HubError::Internal("unknown connection".to_string()));
            }
            if st.rooms.contains(&room_id) {
                return Err(HubError::Conflict(format!(
                    "room '{room_id}' already exists"
                )));
            }
            // A connection holds at most one membership; switching rooms
            // leaves the old one first.
            self.leave_room_locked(&mut st, conn_id, &mut outbox);

            st.rooms.create(&room_id, max_seats, is_public, password)?;
            st.membership.add(&room_id, conn_id);
            st.registry.bind_room(conn_id, &room_id, &username);

            outbox.push((
                conn_id.to_string(),
                ServerMessage::RoomState {
                    room_id: room_id.clone(),
                    max_seats,
                    users: vec![username.clone()],
                },
            ));
            if is_public {
                self.queue_directory(&st, &mut outbox);
            }
            counter!(keys::ROOM_CREATED).increment(1);
            gauge!(keys::ROOM_ACTIVE).increment(1.0);
        }
        info!(conn_id, %room_id, %username, is_public, "room created");
        self.deliver(outbox);
        Ok(())
    }

    pub fn join_room(
        &self,
        conn_id: &str,
        room_id: &str,
        username: &str,
        password: Option<&str>,
    ) -> Result<(), HubError> {
        let room_id = validation::room_id(room_id)?;
        let username = validation::username(username)?;

        let mut outbox = Outbox::new();
        {
            let mut st = self.state.lock();
            if !st.registry.contains(conn_id) {
                return Err(HubError::Internal("unknown connection".to_string()));
            }

            let current = st.membership.count(&room_id);
            let room = st.rooms.check_join(&room_id, password, current)?;
            let max_seats = room.max_seats;

            // usernames are unique within a room, case-sensitive
            let taken = st
                .membership
                .members(&room_id)
                .iter()
                .any(|member| st.registry.username_of(member) == Some(username.as_str()));
            if taken {
                return Err(HubError::Conflict(format!(
                    "username '{username}' already taken in this room"
                )));
            }

            self.leave_room_locked(&mut st, conn_id, &mut outbox);
            st.membership.add(&room_id, conn_id);
            st.registry.bind_room(conn_id, &room_id, &username);

            let users = Self::roster_locked(&st, &room_id);
            for member in st.membership.members(&room_id) {
                if member == conn_id {
                    outbox.push((
                        member.clone(),
                        ServerMessage::RoomState {
                            room_id: room_id.clone(),
                            max_seats,
                            users: users.clone(),
                        },
                    ));
                } else {
                    outbox.push((
                        member.clone(),
                        ServerMessage::UserJoined {
                            room_id: room_id.clone(),
                            username: username.clone(),
                            users: users.clone(),
                        },
                    ));
                }
            }
            self.queue_directory(&st, &mut outbox);
        }
        info!(conn_id, %room_id, %username, "joined room");
        self.deliver(outbox);
        Ok(())
    }

    /// Leave the current room, if any. Fire-and-forget and idempotent.
    pub fn leave_room(&self, conn_id: &str) {
        let mut outbox = Outbox::new();
        {
            let mut st = self.state.lock();
            self.leave_room_locked(&mut st, conn_id, &mut outbox);
        }
        self.deliver(outbox);
    }

    pub fn send_room_message(
        &self,
        conn_id: &str,
        room_id: &str,
        message: &str,
    ) -> Result<(), HubError> {
        let room_id = validation::room_id(room_id)?;
        let message = validation::chat_message(message)?;

        let mut outbox = Outbox::new();
        {
            let st = self.state.lock();
            let session = st.registry.get(conn_id).ok_or_else(|| {
                HubError::Internal("unknown connection".to_string())
            })?;
            let username = session.username.clone().ok_or_else(|| {
                HubError::InvalidArgument("no username bound".to_string())
            })?;
            if session.room_id.as_deref() != Some(room_id.as_str()) {
                return Err(HubError::Unauthorized(
                    "not a member of the stated room".to_string(),
                ));
            }

            let timestamp = Utc::now().timestamp_millis();
            for member in st.membership.members(&room_id) {
                outbox.push((
                    member.clone(),
                    ServerMessage::NewMessage {
                        room_id: room_id.clone(),
                        username: username.clone(),
                        message: message.clone(),
                        timestamp,
                    },
                ));
            }
            counter!(keys::ROOM_MESSAGES).increment(1);
        }
        self.deliver(outbox);
        Ok(())
    }

    // ---- random chat operations ----

    pub fn random_join(
        &self,
        conn_id: &str,
        username: Option<&str>,
    ) -> Result<RandomStatus, HubError> {
        let alias = validation::alias(username)?;

        let mut outbox = Outbox::new();
        let status = {
            let mut st = self.state.lock();
            if !st.registry.contains(conn_id) {
                return Err(HubError::Internal("unknown connection".to_string()));
            }
            // Already paired: report it without re-validating the partner;
            // the disconnect hook tears dead pairings down eagerly.
            if st.random.is_paired(conn_id) {
                return Ok(RandomStatus::Paired);
            }
            if let Some(session) = st.registry.get_mut(conn_id) {
                session.random_alias = Some(alias);
            }
            self.enqueue_locked(&mut st, conn_id, &mut outbox)
        };
        self.deliver(outbox);
        Ok(status)
    }

    /// Skip to a new stranger: end the current pairing (notifying the
    /// partner) and immediately re-enqueue.
    pub fn random_next(&self, conn_id: &str) -> Result<RandomStatus, HubError> {
        let mut outbox = Outbox::new();
        let status = {
            let mut st = self.state.lock();
            if !st.registry.contains(conn_id) {
                return Err(HubError::Internal("unknown connection".to_string()));
            }
            Self::end_random_locked(&mut st, conn_id, true, &mut outbox);
            self.enqueue_locked(&mut st, conn_id, &mut outbox)
        };
        self.deliver(outbox);
        Ok(status)
    }

    /// Leave the random pool entirely: dequeue, clear any pairing, drop
    /// the alias. Idempotent.
    pub fn random_leave(&self, conn_id: &str) {
        let mut outbox = Outbox::new();
        {
            let mut st = self.state.lock();
            Self::end_random_locked(&mut st, conn_id, true, &mut outbox);
            if let Some(session) = st.registry.get_mut(conn_id) {
                session.random_alias = None;
            }
        }
        self.deliver(outbox);
    }

    pub fn random_send_message(
        &self,
        conn_id: &str,
        message: &str,
    ) -> Result<(), HubError> {
        let message = validation::chat_message(message)?;

        let mut outbox = Outbox::new();
        {
            let st = self.state.lock();
            let partner = st
                .random
                .partner_of(conn_id)
                .ok_or_else(|| {
                    HubError::Unauthorized("no active pairing".to_string())
                })?
                .to_string();
            let alias = st
                .registry
                .alias_of(conn_id)
                .unwrap_or(validation::DEFAULT_ALIAS)
                .to_string();
            let timestamp = Utc::now().timestamp_millis();
            // delivered to both sides, tagged with sender identity
            for recipient in [conn_id, partner.as_str()] {
                outbox.push((
                    recipient.to_string(),
                    ServerMessage::RandomNewMessage {
                        from_connection_id: conn_id.to_string(),
                        alias: alias.clone(),
                        message: message.clone(),
                        timestamp,
                    },
                ));
            }
            counter!(keys::RANDOM_MESSAGES).increment(1);
        }
        self.deliver(outbox);
        Ok(())
    }

    // ---- signaling relay ----

    pub fn room_signal(
        &self,
        conn_id: &str,
        kind: SignalKind,
        room_id: &str,
        target: &str,
        payload: serde_json::Value,
    ) -> Result<(), HubError> {
        let target = validation::signal_target(target)?;
        validation::signal_payload(&payload)?;

        let mut outbox = Outbox::new();
        {
            let st = self.state.lock();
            if let Err(err) = relay::authorize_room_signal(
                &st.registry,
                &st.membership,
                conn_id,
                room_id,
                target,
            ) {
                counter!(keys::RELAY_DENIED).increment(1);
                warn!(conn_id, target, room_id, "room signal rejected");
                return Err(err);
            }
            outbox.push((
                target.to_string(),
                relay::room_forward(kind, room_id, conn_id, payload),
            ));
            counter!(keys::RELAY_FORWARDED).increment(1);
        }
        self.deliver(outbox);
        Ok(())
    }

    pub fn random_signal(
        &self,
        conn_id: &str,
        kind: SignalKind,
        target: &str,
        payload: serde_json::Value,
    ) -> Result<(), HubError> {
        let target = validation::signal_target(target)?;
        validation::signal_payload(&payload)?;

        let mut outbox = Outbox::new();
        {
            let st = self.state.lock();
            if let Err(err) = relay::authorize_random_signal(&st.random, conn_id, target)
            {
                counter!(keys::RELAY_DENIED).increment(1);
                warn!(conn_id, target, "random signal rejected");
                return Err(err);
            }
            outbox.push((
                target.to_string(),
                relay::random_forward(kind, conn_id, payload),
            ));
            counter!(keys::RELAY_FORWARDED).increment(1);
        }
        self.deliver(outbox);
        Ok(())
    }

    // ---- inspection (used by tests and the live handler) ----

    /// Number of members currently in a room; 0 if the room is gone.
    pub fn user_count_in_room(&self, room_id: &str) -> usize {
        self.state.lock().membership.count(room_id)
    }

    pub fn room_exists(&self, room_id: &str) -> bool {
        self.state.lock().rooms.contains(room_id)
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    // ---- internals ----

    /// Remove room membership for a connection, emitting the departure
    /// roster, deleting the room if emptied, and refreshing the public
    /// directory. Returns false when there was nothing to do.
    fn leave_room_locked(
        &self,
        st: &mut HubState,
        conn_id: &str,
        outbox: &mut Outbox,
    ) -> bool {
        let Some((room_id, username)) = st.registry.clear_room(conn_id) else {
            return false;
        };
        st.membership.remove(&room_id, conn_id);

        if st.membership.count(&room_id) == 0 {
            st.rooms.remove(&room_id);
            counter!(keys::ROOM_DELETED).increment(1);
            gauge!(keys::ROOM_ACTIVE).decrement(1.0);
            info!(%room_id, "room emptied and deleted");
        } else {
            let users = Self::roster_locked(st, &room_id);
            for member in st.membership.members(&room_id) {
                outbox.push((
                    member.clone(),
                    ServerMessage::UserLeft {
                        room_id: room_id.clone(),
                        username: username.clone(),
                        users: users.clone(),
                    },
                ));
            }
        }

        self.queue_directory(st, outbox);
        true
    }

    /// Enqueue for random pairing and emit the match/waiting events.
    fn enqueue_locked(
        &self,
        st: &mut HubState,
        conn_id: &str,
        outbox: &mut Outbox,
    ) -> RandomStatus {
        let senders = &self.senders;
        let outcome = st.random.enqueue(conn_id, |c| senders.contains_key(c));
        match outcome {
            EnqueueOutcome::Matched { partner } => {
                let my_alias = st
                    .registry
                    .alias_of(conn_id)
                    .unwrap_or(validation::DEFAULT_ALIAS)
                    .to_string();
                let partner_alias = st
                    .registry
                    .alias_of(&partner)
                    .unwrap_or(validation::DEFAULT_ALIAS)
                    .to_string();
                // the requester drives the offer
                outbox.push((
                    conn_id.to_string(),
                    ServerMessage::RandomMatched {
                        partner_id: partner.clone(),
                        partner_alias,
                        initiator: true,
                    },
                ));
                outbox.push((
                    partner.clone(),
                    ServerMessage::RandomMatched {
                        partner_id: conn_id.to_string(),
                        partner_alias: my_alias,
                        initiator: false,
                    },
                ));
                counter!(keys::RANDOM_MATCHED).increment(1);
                info!(conn_id, %partner, "random pair matched");
                RandomStatus::Paired
            },
            EnqueueOutcome::Waiting => {
                outbox.push((conn_id.to_string(), ServerMessage::RandomWaiting));
                counter!(keys::RANDOM_WAITING).increment(1);
                RandomStatus::Searching
            },
        }
    }

    /// Clear any pairing for a connection, notifying the partner if asked.
    /// Returns true when an active pairing existed.
    fn end_random_locked(
        st: &mut HubState,
        conn_id: &str,
        notify_partner: bool,
        outbox: &mut Outbox,
    ) -> bool {
        match st.random.end_session(conn_id) {
            Some(partner) => {
                if notify_partner {
                    outbox.push((partner, ServerMessage::RandomDisconnected));
                }
                true
            },
            None => false,
        }
    }

    fn roster_locked(st: &HubState, room_id: &str) -> Vec<String> {
        st.membership
            .members(room_id)
            .iter()
            .filter_map(|member| st.registry.username_of(member))
            .map(String::from)
            .collect()
    }

    /// Queue a public-directory snapshot for every live connection.
    fn queue_directory(&self, st: &HubState, outbox: &mut Outbox) {
        let rooms = st.rooms.public_rooms(&st.membership);
        for entry in self.senders.iter() {
            outbox.push((
                entry.key().clone(),
                ServerMessage::PublicRooms { rooms: rooms.clone() },
            ));
        }
    }

    /// Fire-and-forget delivery; recipients that disappeared mid-operation
    /// are skipped.
    fn deliver(&self, outbox: Outbox) {
        for (conn_id, msg) in outbox {
            if let Some(tx) = self.senders.get(&conn_id) {
                let _ = tx.send(msg);
            }
        }
    }
}
