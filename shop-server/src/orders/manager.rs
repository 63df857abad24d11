//! OrdersManager - order lifecycle
//!
//! Every command runs in this order:
//!
//! ```text
//! validate ─► BEGIN ─► stock / status compare-and-set ─► tracking entry ─► COMMIT
//!                                                                           │
//!                                                   OrderEventBus::publish ◄┘
//! ```
//!
//! Events are only published after commit, so subscribers never see a step
//! that was rolled back. Stock reservation and status changes are
//! conditional updates; a concurrent loser observes zero rows and gets a
//! typed error instead of corrupting state.

use shared::models::{
    Order, OrderCreate, OrderItem, OrderPage, OrderStatus, OrderStatusUpdate, OtpIssued,
    PaymentMethod, TrackingEntry, order_total,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::otp::{self, OtpPolicy};
use super::{OrderError, OrderResult};
use crate::auth::CurrentUser;
use crate::db::repository::order::{self as order_repo, NewOrder, OtpState};
use crate::db::repository::{paginate, user as user_repo};
use crate::inventory;
use crate::notify::{
    EmailTemplate, Mailer, OrderEvent, OrderEventBus, OrderPlaced, OrderTransitioned,
    send_in_background,
};
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_phone, validate_optional_text,
    validate_order_create,
};

const DEFAULT_LOCATION: &str = "Processing Center";
const DEFAULT_CANCEL_REASON: &str = "Order cancelled by user";
const MY_ORDERS_DEFAULT_LIMIT: u32 = 10;
const ALL_ORDERS_DEFAULT_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct OrdersManager {
    pool: SqlitePool,
    events: OrderEventBus,
    mailer: Arc<dyn Mailer>,
    otp: OtpPolicy,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("events", &self.events)
            .field("otp", &self.otp)
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(
        pool: SqlitePool,
        events: OrderEventBus,
        mailer: Arc<dyn Mailer>,
        otp: OtpPolicy,
    ) -> Self {
        Self {
            pool,
            events,
            mailer,
            otp,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        self.otp
    }

    // ========== Commands ==========

    /// Reserve stock, persist a pending order and email its confirmation code
    pub async fn create_order(&self, user: &CurrentUser, mut req: OrderCreate) -> OrderResult<Order> {
        validate_order_create(&req)?;
        if let Some(phone) = normalize_phone(&req.shipping_address.phone) {
            req.shipping_address.phone = phone;
        }
        if req.payment_method == PaymentMethod::Cod && req.payment_details.is_some() {
            return Err(OrderError::InvalidPayment(
                "payment details are not accepted for cash on delivery".into(),
            ));
        }

        let now = now_millis();
        let issued = self.otp.issue(now)?;
        let order_id = snowflake_id();

        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(req.items.len());
        for line in &req.items {
            // Dropping `tx` on error rolls back earlier reservations
            let reserved = inventory::reserve(&mut tx, line.product_id, line.quantity).await?;
            items.push(OrderItem {
                product_id: line.product_id,
                name: reserved.name,
                quantity: line.quantity,
                unit_price: reserved.price,
            });
        }
        let total = order_total(&items);

        order_repo::insert(
            &mut tx,
            &NewOrder {
                id: order_id,
                user_id: user.id,
                items: &items,
                total,
                shipping_address: &req.shipping_address,
                payment_method: req.payment_method,
                payment_details: req.payment_details.as_ref(),
                notes: req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
                otp_hash: &issued.hash,
                otp_expires_at: issued.expires_at,
                created_at: now,
            },
        )
        .await?;
        order_repo::append_tracking(
            &mut tx,
            order_id,
            "Order Placed",
            DEFAULT_LOCATION,
            "Your order has been received and is being processed",
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(order_id, user_id = user.id, total, lines = items.len(), "Order placed");

        send_in_background(
            self.mailer.clone(),
            user.email.clone(),
            EmailTemplate::OrderOtp {
                order_id,
                otp: issued.code,
                valid_minutes: self.otp.ttl_minutes(),
            },
        );
        self.events.publish(OrderEvent::Placed(OrderPlaced {
            order_id,
            user_id: user.id,
            total,
            item_count: items.len(),
            created_at: now,
        }));

        self.load(order_id).await
    }

    /// Check the submitted code and confirm the order
    pub async fn verify_otp(
        &self,
        user: &CurrentUser,
        order_id: i64,
        submitted: &str,
    ) -> OrderResult<Order> {
        let state = self.pending_otp_state(user, order_id).await?;
        if self.otp.attempts_exhausted(state.otp_attempts) {
            crate::security_log!(WARN, "otp_locked", order_id = order_id, user_id = user.id);
            return Err(OrderError::TooManyAttempts);
        }

        let Some(hash) = state.otp_hash.as_deref() else {
            return Err(OrderError::InvalidOtp);
        };
        if !otp::matches(submitted, hash) {
            order_repo::record_failed_otp(&self.pool, order_id).await?;
            crate::security_log!(
                WARN,
                "otp_mismatch",
                order_id = order_id,
                user_id = user.id,
                attempts = state.otp_attempts + 1
            );
            return Err(OrderError::InvalidOtp);
        }

        let now = now_millis();
        if state.otp_expires_at.is_none_or(|expires_at| now > expires_at) {
            return Err(OrderError::OtpExpired);
        }

        let mut tx = self.pool.begin().await?;
        if !order_repo::confirm_verified(&mut tx, order_id, now).await? {
            // Lost a race with another verification or a cancellation
            let head = order_repo::find_head_in(&mut tx, order_id).await?;
            return Err(match head {
                Some(h) if h.otp_verified => OrderError::AlreadyVerified,
                Some(h) => OrderError::InvalidState(h.status),
                None => OrderError::NotFound(order_id),
            });
        }
        let tracking = order_repo::append_tracking(
            &mut tx,
            order_id,
            "Order Confirmed",
            DEFAULT_LOCATION,
            "Your order has been confirmed and is being prepared for shipment",
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(order_id, user_id = user.id, "Order confirmed by OTP");
        self.publish_transition(
            order_id,
            state.user_id,
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            tracking,
            now,
        )
        .await;

        self.load(order_id).await
    }

    /// Issue a fresh code for a still-pending order
    pub async fn resend_otp(&self, user: &CurrentUser, order_id: i64) -> OrderResult<OtpIssued> {
        self.pending_otp_state(user, order_id).await?;

        let issued = self.otp.issue(now_millis())?;
        if !order_repo::replace_otp(&self.pool, order_id, &issued.hash, issued.expires_at).await? {
            return Err(match order_repo::find_head(&self.pool, order_id).await? {
                Some(h) if h.otp_verified => OrderError::AlreadyVerified,
                Some(h) => OrderError::InvalidState(h.status),
                None => OrderError::NotFound(order_id),
            });
        }

        tracing::info!(order_id, user_id = user.id, "Order OTP reissued");
        send_in_background(
            self.mailer.clone(),
            user.email.clone(),
            EmailTemplate::OrderOtp {
                order_id,
                otp: issued.code,
                valid_minutes: self.otp.ttl_minutes(),
            },
        );

        Ok(OtpIssued {
            order_id,
            expires_at: issued.expires_at,
        })
    }

    /// Admin status change; `cancelled` goes through the cancellation path
    pub async fn update_status(&self, order_id: i64, req: OrderStatusUpdate) -> OrderResult<Order> {
        let to: OrderStatus = req
            .status
            .trim()
            .parse()
            .map_err(|e: shared::models::UnknownOrderStatus| OrderError::Validation(e.to_string()))?;
        validate_optional_text(&req.location, "location", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
        if req.estimated_delivery.is_some_and(|at| at <= 0) {
            return Err(OrderError::Validation(
                "estimated_delivery must be a positive unix millis timestamp".into(),
            ));
        }

        if to == OrderStatus::Cancelled {
            return self.cancel_inner(order_id, req.description.as_deref()).await;
        }

        let head = order_repo::find_head(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        if !head.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: head.status,
                to,
            });
        }

        let location = non_blank(req.location.as_deref()).unwrap_or(DEFAULT_LOCATION);
        let description = non_blank(req.description.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Order status updated to {to}"));

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        if !order_repo::transition_status(
            &mut tx,
            order_id,
            head.status,
            to,
            None,
            req.estimated_delivery,
            now,
        )
        .await?
        {
            let current = order_repo::find_head_in(&mut tx, order_id)
                .await?
                .map(|h| h.status)
                .unwrap_or(head.status);
            return Err(OrderError::InvalidTransition { from: current, to });
        }
        let tracking =
            order_repo::append_tracking(&mut tx, order_id, to.label(), location, &description, now)
                .await?;
        tx.commit().await?;

        tracing::info!(order_id, from = %head.status, to = %to, "Order status updated");
        self.publish_transition(order_id, head.user_id, head.status, to, tracking, now)
            .await;

        self.load(order_id).await
    }

    /// Customer cancellation, limited to the caller's own orders
    pub async fn cancel_order(
        &self,
        user: &CurrentUser,
        order_id: i64,
        reason: Option<String>,
    ) -> OrderResult<Order> {
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;
        let head = order_repo::find_head(&self.pool, order_id)
            .await?
            .filter(|h| h.user_id == user.id)
            .ok_or(OrderError::NotFound(order_id))?;
        if head.status.is_terminal() {
            return Err(OrderError::InvalidState(head.status));
        }
        self.cancel_inner(order_id, reason.as_deref()).await
    }

    async fn cancel_inner(&self, order_id: i64, reason: Option<&str>) -> OrderResult<Order> {
        let reason = non_blank(reason).unwrap_or(DEFAULT_CANCEL_REASON);
        let mut head = order_repo::find_head(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        // Compare-and-set stays the first statement: a stale WAL read
        // snapshot cannot be upgraded to a write.
        let (from, released_lines, tracking, now) = loop {
            if head.status.is_terminal() {
                return Err(OrderError::InvalidState(head.status));
            }
            let now = now_millis();
            let mut tx = self.pool.begin().await?;
            if order_repo::transition_status(
                &mut tx,
                order_id,
                head.status,
                OrderStatus::Cancelled,
                Some(reason),
                None,
                now,
            )
            .await?
            {
                let items = order_repo::find_items(&mut tx, order_id).await?;
                for item in &items {
                    inventory::release(&mut tx, item.product_id, item.quantity).await?;
                }
                let tracking = order_repo::append_tracking(
                    &mut tx,
                    order_id,
                    "Order Cancelled",
                    "System",
                    reason,
                    now,
                )
                .await?;
                tx.commit().await?;
                break (head.status, items.len(), tracking, now);
            }
            drop(tx);

            // Status moved underneath us; statuses only move forward, so this ends
            head = order_repo::find_head(&self.pool, order_id)
                .await?
                .ok_or(OrderError::NotFound(order_id))?;
        };

        tracing::info!(order_id, from = %from, released_lines, "Order cancelled");
        self.publish_transition(
            order_id,
            head.user_id,
            from,
            OrderStatus::Cancelled,
            tracking,
            now,
        )
        .await;

        self.load(order_id).await
    }

    // ========== Queries ==========

    pub async fn list_my_orders(
        &self,
        user: &CurrentUser,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> OrderResult<OrderPage> {
        let (page, limit, offset) = paginate(page, limit, MY_ORDERS_DEFAULT_LIMIT);
        let orders = order_repo::find_by_user(&self.pool, user.id, limit, offset).await?;
        let total = order_repo::count_by_user(&self.pool, user.id).await?;
        Ok(page_of(orders, page, limit, total))
    }

    /// Owner or admin; anyone else sees `NotFound`
    pub async fn get_order(&self, user: &CurrentUser, order_id: i64) -> OrderResult<Order> {
        order_repo::find_by_id(&self.pool, order_id)
            .await?
            .filter(|o| o.user_id == user.id || user.is_admin())
            .ok_or(OrderError::NotFound(order_id))
    }

    pub async fn list_orders(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        status: Option<&str>,
    ) -> OrderResult<OrderPage> {
        let status = match non_blank(status) {
            Some(s) => Some(
                s.parse::<OrderStatus>()
                    .map_err(|e| OrderError::Validation(e.to_string()))?,
            ),
            None => None,
        };
        let (page, limit, offset) = paginate(page, limit, ALL_ORDERS_DEFAULT_LIMIT);
        let orders = order_repo::find_all(&self.pool, status, limit, offset).await?;
        let total = order_repo::count_all(&self.pool, status).await?;
        Ok(page_of(orders, page, limit, total))
    }

    // ========== Helpers ==========

    /// Owner-scoped OTP state of an order that can still be confirmed
    async fn pending_otp_state(&self, user: &CurrentUser, order_id: i64) -> OrderResult<OtpState> {
        let state = order_repo::find_otp_state(&self.pool, order_id)
            .await?
            .filter(|s| s.user_id == user.id)
            .ok_or(OrderError::NotFound(order_id))?;
        if state.otp_verified {
            return Err(OrderError::AlreadyVerified);
        }
        if state.status != OrderStatus::Pending {
            return Err(OrderError::InvalidState(state.status));
        }
        Ok(state)
    }

    async fn load(&self, order_id: i64) -> OrderResult<Order> {
        order_repo::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    async fn publish_transition(
        &self,
        order_id: i64,
        user_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        tracking: TrackingEntry,
        updated_at: i64,
    ) {
        let user_email = match user_repo::find_by_id(&self.pool, user_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                tracing::warn!(order_id, user_id, error = %e, "Owner lookup failed, status email skipped");
                None
            }
        };
        self.events
            .publish(OrderEvent::Transitioned(OrderTransitioned {
                order_id,
                user_id,
                user_email,
                from,
                to,
                tracking,
                updated_at,
            }));
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn page_of(orders: Vec<Order>, page: u32, limit: u32, total: i64) -> OrderPage {
    let limit_i = i64::from(limit);
    OrderPage {
        orders,
        page,
        limit,
        total,
        total_pages: (total + limit_i - 1) / limit_i,
    }
}
