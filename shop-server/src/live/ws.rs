//! Live WebSocket endpoint
//!
//! GET /ws?token=<JWT>
//! The JWT travels as a query parameter because browser WebSockets cannot
//! set headers.
//!
//! Protocol:
//! - Client → Server: LiveCommand (join/leave rooms)
//! - Server → Client: LiveMessage (acks, errors, room events)

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use shared::live::{LiveCommand, LiveMessage, Room};
use sqlx::SqlitePool;
use tokio::time::Duration;

use super::{ConnectionId, RoomHub};
use crate::auth::CurrentUser;
use crate::auth::extractor::authenticate_token;
use crate::db::repository::order as order_repo;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// GET /ws?token=<JWT>
pub async fn handle_live_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate_token(&query.token, &state.jwt, "/ws")?;
    Ok(ws.on_upgrade(move |socket| live_session(socket, state, user)))
}

async fn live_session(socket: WebSocket, state: AppState, user: CurrentUser) {
    let (mut sink, mut stream) = socket.split();
    let (conn_id, mut rx) = state.rooms.connect();

    tracing::info!(user_id = user.id, connection = %conn_id, "Live WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(msg) => {
                        if send_message(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<LiveCommand>(&text) {
                            Ok(cmd) => apply_command(&state.rooms, &state.db.pool, conn_id, &user, cmd).await,
                            Err(e) => LiveMessage::Error {
                                message: format!("Invalid command: {e}"),
                            },
                        };
                        if send_message(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.rooms.disconnect(conn_id);
    tracing::info!(user_id = user.id, connection = %conn_id, "Live WS disconnected");
}

enum Membership {
    Join(Room),
    Leave(Room),
}

/// Check a command against the caller and apply it to the hub
async fn apply_command(
    hub: &RoomHub,
    pool: &SqlitePool,
    conn_id: ConnectionId,
    user: &CurrentUser,
    cmd: LiveCommand,
) -> LiveMessage {
    match authorize_command(pool, user, cmd).await {
        Ok(Membership::Join(room)) => {
            if hub.join(conn_id, room) {
                LiveMessage::Joined {
                    room: room.to_string(),
                }
            } else {
                LiveMessage::Error {
                    message: "Connection closed".into(),
                }
            }
        }
        Ok(Membership::Leave(room)) => {
            hub.leave(conn_id, room);
            LiveMessage::Left {
                room: room.to_string(),
            }
        }
        Err(message) => LiveMessage::Error { message },
    }
}

async fn authorize_command(
    pool: &SqlitePool,
    user: &CurrentUser,
    cmd: LiveCommand,
) -> Result<Membership, String> {
    match cmd {
        LiveCommand::JoinUserRoom { user_id } => {
            if user_id != user.id {
                crate::security_log!(WARN, "live_foreign_user_room", user_id = user.id, requested = user_id);
                return Err("Cannot join another user's room".into());
            }
            Ok(Membership::Join(Room::User(user_id)))
        }
        LiveCommand::JoinAdminRoom => {
            if !user.is_admin() {
                crate::security_log!(WARN, "live_admin_room_denied", user_id = user.id);
                return Err("Admin role required".into());
            }
            Ok(Membership::Join(Room::Admin))
        }
        LiveCommand::TrackOrder { order_id } => {
            let head = order_repo::find_head(pool, order_id).await.map_err(|e| {
                tracing::error!(order_id, error = %e, "Order lookup failed for live tracking");
                "Failed to look up order".to_string()
            })?;
            match head {
                Some(h) if h.user_id == user.id || user.is_admin() => {
                    Ok(Membership::Join(Room::Order(order_id)))
                }
                _ => Err(format!("Order {order_id} not found")),
            }
        }
        LiveCommand::UntrackOrder { order_id } => Ok(Membership::Leave(Room::Order(order_id))),
    }
}

async fn send_message<S>(sink: &mut S, msg: &LiveMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::user;
    use shared::models::UserRole;

    fn caller(id: i64, role: UserRole) -> CurrentUser {
        CurrentUser {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    async fn seed_order(db: &DbService, owner_email: &str) -> (i64, i64) {
        let owner = user::create(
            &db.pool,
            user::NewUser {
                name: "Asha Rao",
                email: owner_email,
                password_hash: "x",
                role: UserRole::Customer,
                phone: None,
            },
        )
        .await
        .unwrap();
        let order_id = 42;
        sqlx::query(
            "INSERT INTO orders (id, user_id, total, status, shipping_address, payment_method, payment_status, created_at, updated_at) VALUES (?1, ?2, 100, 'pending', '{}', 'cod', 'pending', 0, 0)",
        )
        .bind(order_id)
        .bind(owner.id)
        .execute(&db.pool)
        .await
        .unwrap();
        (owner.id, order_id)
    }

    #[tokio::test]
    async fn test_user_room_is_own_only() {
        let db = DbService::in_memory().await.unwrap();
        let hub = RoomHub::new();
        let (conn, _rx) = hub.connect();
        let me = caller(7, UserRole::Customer);

        let reply = apply_command(&hub, &db.pool, conn, &me, LiveCommand::JoinUserRoom { user_id: 7 }).await;
        assert!(matches!(reply, LiveMessage::Joined { ref room } if room == "user_7"));

        let reply = apply_command(&hub, &db.pool, conn, &me, LiveCommand::JoinUserRoom { user_id: 8 }).await;
        assert!(matches!(reply, LiveMessage::Error { .. }));
        assert_eq!(hub.room_size(Room::User(8)), 0);
    }

    #[tokio::test]
    async fn test_admin_room_requires_admin() {
        let db = DbService::in_memory().await.unwrap();
        let hub = RoomHub::new();
        let (conn, _rx) = hub.connect();

        let reply = apply_command(&hub, &db.pool, conn, &caller(7, UserRole::Customer), LiveCommand::JoinAdminRoom).await;
        assert!(matches!(reply, LiveMessage::Error { .. }));

        let reply = apply_command(&hub, &db.pool, conn, &caller(1, UserRole::Admin), LiveCommand::JoinAdminRoom).await;
        assert!(matches!(reply, LiveMessage::Joined { ref room } if room == "admin_room"));
        assert_eq!(hub.room_size(Room::Admin), 1);
    }

    #[tokio::test]
    async fn test_track_order_owner_or_admin() {
        let db = DbService::in_memory().await.unwrap();
        let (owner_id, order_id) = seed_order(&db, "asha@example.com").await;
        let hub = RoomHub::new();
        let (conn, _rx) = hub.connect();

        let stranger = caller(owner_id + 1, UserRole::Customer);
        let reply = apply_command(&hub, &db.pool, conn, &stranger, LiveCommand::TrackOrder { order_id }).await;
        assert!(matches!(reply, LiveMessage::Error { .. }));

        let owner = caller(owner_id, UserRole::Customer);
        let reply = apply_command(&hub, &db.pool, conn, &owner, LiveCommand::TrackOrder { order_id }).await;
        assert!(matches!(reply, LiveMessage::Joined { ref room } if room == "order_42"));

        let reply = apply_command(&hub, &db.pool, conn, &owner, LiveCommand::UntrackOrder { order_id }).await;
        assert!(matches!(reply, LiveMessage::Left { .. }));
        assert_eq!(hub.room_size(Room::Order(order_id)), 0);

        let admin = caller(1, UserRole::Admin);
        let reply = apply_command(&hub, &db.pool, conn, &admin, LiveCommand::TrackOrder { order_id }).await;
        assert!(matches!(reply, LiveMessage::Joined { .. }));
    }
}
