//! Live WebSocket protocol
//!
//! Client → Server: LiveCommand (room membership)
//! Server → Client: LiveMessage (acks and pushed events)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{OrderStatus, TrackingEntry};

/// A named broadcast room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Private channel of one user: `user_<id>`
    User(i64),
    /// Tracking channel of one order: `order_<id>`
    Order(i64),
    /// Shared channel of all admins: `admin_room`
    Admin,
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user_{id}"),
            Room::Order(id) => write!(f, "order_{id}"),
            Room::Admin => f.write_str("admin_room"),
        }
    }
}

/// Client → Server command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveCommand {
    /// Join the caller's own user room
    JoinUserRoom { user_id: i64 },
    /// Join the admin room (admins only)
    JoinAdminRoom,
    /// Follow one order
    TrackOrder { order_id: i64 },
    /// Stop following one order
    UntrackOrder { order_id: i64 },
}

/// Event names pushed into rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveEventName {
    /// Sent to the owner's user room
    OrderStatusChanged,
    /// Sent to the order's tracking room
    OrderUpdated,
    /// Sent to the admin room
    OrderStatusUpdated,
    /// Sent to the admin room when an order is placed
    NewOrder,
}

/// Server → Client message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    Joined { room: String },
    Left { room: String },
    Error { message: String },
    Event {
        room: String,
        name: LiveEventName,
        payload: serde_json::Value,
    },
}

/// Payload of the three status-change events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusPayload {
    pub order_id: i64,
    pub user_id: i64,
    pub from: OrderStatus,
    pub status: OrderStatus,
    /// Entry appended by this transition
    pub tracking: TrackingEntry,
    pub updated_at: i64,
}

/// Payload of `new_order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderPayload {
    pub order_id: i64,
    pub user_id: i64,
    pub total: i64,
    pub item_count: usize,
    pub created_at: i64,
}
