//! Room hub
//!
//! In-process pub/sub for WebSocket clients. Each connection owns a bounded
//! queue; emitting into a room `try_send`s to every member, so delivery is
//! at-most-once and a stalled client only loses its own messages.
//!
//! ```text
//! OrderEvent ─► room fan-out worker ─► RoomHub::emit(room)
//!                                        │
//!                          rooms: room → {connection ids}
//!                                        │
//!                          connections: id → mpsc::Sender<LiveMessage>
//!                                        ▼
//!                                   WS session task
//! ```

pub mod ws;

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use shared::live::{LiveEventName, LiveMessage, Room};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Per-connection outbound queue capacity
const CONNECTION_QUEUE_CAPACITY: usize = 64;

pub type ConnectionId = Uuid;

struct Connection {
    tx: mpsc::Sender<LiveMessage>,
    rooms: HashSet<Room>,
}

#[derive(Default)]
struct HubInner {
    rooms: DashMap<Room, DashSet<ConnectionId>>,
    connections: DashMap<ConnectionId, Connection>,
}

#[derive(Clone, Default)]
pub struct RoomHub {
    inner: Arc<HubInner>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and hand back its outbound queue
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<LiveMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CONNECTION_QUEUE_CAPACITY);
        self.inner.connections.insert(
            id,
            Connection {
                tx,
                rooms: HashSet::new(),
            },
        );
        (id, rx)
    }

    /// Drop a connection and remove it from every room it joined
    pub fn disconnect(&self, id: ConnectionId) {
        let Some((_, conn)) = self.inner.connections.remove(&id) else {
            return;
        };
        for room in conn.rooms {
            self.remove_member(room, id);
        }
    }

    /// Returns false if the connection is gone
    pub fn join(&self, id: ConnectionId, room: Room) -> bool {
        match self.inner.connections.get_mut(&id) {
            Some(mut conn) => {
                conn.rooms.insert(room);
            }
            None => return false,
        }
        self.inner.rooms.entry(room).or_default().insert(id);
        true
    }

    pub fn leave(&self, id: ConnectionId, room: Room) {
        if let Some(mut conn) = self.inner.connections.get_mut(&id) {
            conn.rooms.remove(&room);
        }
        self.remove_member(room, id);
    }

    /// Push an event to every member of `room`; returns how many queued it
    pub fn emit(&self, room: Room, name: LiveEventName, payload: Value) -> usize {
        let members: Vec<ConnectionId> = match self.inner.rooms.get(&room) {
            Some(set) => set.iter().map(|id| *id).collect(),
            None => return 0,
        };

        let msg = LiveMessage::Event {
            room: room.to_string(),
            name,
            payload,
        };

        let mut delivered = 0;
        for id in members {
            let Some(conn) = self.inner.connections.get(&id) else {
                continue;
            };
            match conn.tx.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection = %id, room = %room, "Live queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    pub fn room_size(&self, room: Room) -> usize {
        self.inner.rooms.get(&room).map(|s| s.len()).unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    fn remove_member(&self, room: Room, id: ConnectionId) {
        if let Some(set) = self.inner.rooms.get(&room) {
            set.remove(&id);
        }
        self.inner.rooms.remove_if(&room, |_, set| set.is_empty());
    }
}
