//! Order event bus
//!
//! One broadcast channel; every committed lifecycle step publishes exactly
//! one event. Subscribers (room fan-out, email) run independently, so a slow
//! or failing subscriber never blocks the request that caused the event.

use shared::models::{OrderStatus, TrackingEntry};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: i64,
    pub user_id: i64,
    pub total: i64,
    pub item_count: usize,
    pub created_at: i64,
}

/// A committed status change, carrying the tracking entry it appended
#[derive(Debug, Clone)]
pub struct OrderTransitioned {
    pub order_id: i64,
    pub user_id: i64,
    /// Owner's address for the status email; `None` if the lookup failed
    pub user_email: Option<String>,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub tracking: TrackingEntry,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub enum OrderEvent {
    Placed(OrderPlaced),
    Transitioned(OrderTransitioned),
}

impl OrderEvent {
    pub fn order_id(&self) -> i64 {
        match self {
            OrderEvent::Placed(e) => e.order_id,
            OrderEvent::Transitioned(e) => e.order_id,
        }
    }
}

#[derive(Clone)]
pub struct OrderEventBus {
    event_tx: broadcast::Sender<OrderEvent>,
}

impl std::fmt::Debug for OrderEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEventBus")
            .field("receivers", &self.event_tx.receiver_count())
            .finish()
    }
}

impl Default for OrderEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderEventBus {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { event_tx }
    }

    /// Publish to all current subscribers; returns how many received it
    pub fn publish(&self, event: OrderEvent) -> usize {
        let order_id = event.order_id();
        match self.event_tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!(order_id, "Order event dropped: no active subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }
}
