//! Event bus subscribers
//!
//! - room fan-out: pushes each event into the matching live rooms
//! - email: sends the owner a status email on every transition
//!
//! Both run until the shutdown token fires or the bus closes. A lagged
//! receiver skips the missed events; nothing is replayed.

use serde_json::Value;
use shared::live::{LiveEventName, NewOrderPayload, OrderStatusPayload, Room};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::bus::{OrderEvent, OrderEventBus};
use super::email::{EmailTemplate, Mailer, send_in_background};
use crate::live::RoomHub;
use crate::tasks::{BackgroundTasks, TaskKind};

/// Register both subscribers
///
/// Receivers are created here, before the tasks start, so no event
/// published after this call is missed.
pub fn spawn_workers(
    tasks: &mut BackgroundTasks,
    bus: &OrderEventBus,
    hub: RoomHub,
    mailer: Arc<dyn Mailer>,
) {
    let shutdown = tasks.shutdown_token();
    let rx = bus.subscribe();
    tasks.spawn(
        "room_fanout",
        TaskKind::Listener,
        run_room_fanout(rx, hub, shutdown.clone()),
    );

    let rx = bus.subscribe();
    tasks.spawn(
        "order_email",
        TaskKind::Worker,
        run_email_worker(rx, mailer, shutdown),
    );
}

/// Map one event onto room emits; returns the number of deliveries
pub fn dispatch_to_rooms(hub: &RoomHub, event: &OrderEvent) -> usize {
    match event {
        OrderEvent::Placed(placed) => {
            let payload = NewOrderPayload {
                order_id: placed.order_id,
                user_id: placed.user_id,
                total: placed.total,
                item_count: placed.item_count,
                created_at: placed.created_at,
            };
            hub.emit(Room::Admin, LiveEventName::NewOrder, to_value(&payload))
        }
        OrderEvent::Transitioned(t) => {
            let payload = to_value(&OrderStatusPayload {
                order_id: t.order_id,
                user_id: t.user_id,
                from: t.from,
                status: t.to,
                tracking: t.tracking.clone(),
                updated_at: t.updated_at,
            });
            hub.emit(
                Room::User(t.user_id),
                LiveEventName::OrderStatusChanged,
                payload.clone(),
            ) + hub.emit(
                Room::Order(t.order_id),
                LiveEventName::OrderUpdated,
                payload.clone(),
            ) + hub.emit(Room::Admin, LiveEventName::OrderStatusUpdated, payload)
        }
    }
}

fn to_value<T: serde::Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize live payload");
        Value::Null
    })
}

async fn run_room_fanout(
    mut rx: broadcast::Receiver<OrderEvent>,
    hub: RoomHub,
    shutdown: CancellationToken,
) {
    tracing::info!("Room fan-out worker started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Room fan-out worker received shutdown signal");
                return;
            }
            result = rx.recv() => match result {
                Ok(event) => {
                    let delivered = dispatch_to_rooms(&hub, &event);
                    tracing::debug!(order_id = event.order_id(), delivered, "Order event fanned out");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Room fan-out lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Order event bus closed, room fan-out stopping");
                    return;
                }
            }
        }
    }
}

async fn run_email_worker(
    mut rx: broadcast::Receiver<OrderEvent>,
    mailer: Arc<dyn Mailer>,
    shutdown: CancellationToken,
) {
    tracing::info!("Order email worker started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Order email worker received shutdown signal");
                return;
            }
            result = rx.recv() => match result {
                Ok(OrderEvent::Transitioned(t)) => {
                    let Some(to) = t.user_email else {
                        tracing::warn!(order_id = t.order_id, "No owner email, status email skipped");
                        continue;
                    };
                    let email = EmailTemplate::OrderStatus {
                        order_id: t.order_id,
                        status: t.to,
                        tracking: t.tracking,
                    };
                    // Delivery runs off the receive loop so a slow transport cannot lag the bus
                    send_in_background(mailer.clone(), to, email);
                }
                Ok(OrderEvent::Placed(_)) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Order email worker lagged, emails skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Order event bus closed, email worker stopping");
                    return;
                }
            }
        }
    }
}
