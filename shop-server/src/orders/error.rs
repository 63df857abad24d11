use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::inventory::InventoryError;

/// Order lifecycle errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order {0} not found")]
    NotFound(i64),

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Order is {0} and cannot be changed this way")]
    InvalidState(OrderStatus),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already verified")]
    AlreadyVerified,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Too many failed OTP attempts, request a new code")]
    TooManyAttempts,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidPayment(String),

    #[error("Order storage error: {0}")]
    Storage(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Storage(err.to_string())
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Validation(msg) => OrderError::Validation(msg),
            other => OrderError::Storage(other.to_string()),
        }
    }
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(id) => OrderError::ProductNotFound(id),
            InventoryError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => OrderError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            },
            InventoryError::Database(e) => OrderError::Storage(e.to_string()),
        }
    }
}

/// Validation helpers report through `AppError`; keep their message
impl From<AppError> for OrderError {
    fn from(err: AppError) -> Self {
        OrderError::Validation(err.message)
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message)
                    .with_detail("product_id", id)
            }
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => AppError::with_message(ErrorCode::InsufficientStock, message)
                .with_detail("product_id", product_id)
                .with_detail("available", available)
                .with_detail("requested", requested),
            OrderError::InvalidState(status) => {
                AppError::with_message(ErrorCode::InvalidState, message)
                    .with_detail("status", status.as_str())
            }
            OrderError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::InvalidTransition, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::AlreadyVerified => AppError::new(ErrorCode::AlreadyVerified),
            OrderError::InvalidOtp => AppError::new(ErrorCode::InvalidOtp),
            OrderError::OtpExpired => AppError::new(ErrorCode::OtpExpired),
            OrderError::TooManyAttempts => AppError::with_message(ErrorCode::TooManyAttempts, message),
            OrderError::Validation(_) => AppError::validation(message),
            OrderError::InvalidPayment(_) => {
                AppError::with_message(ErrorCode::PaymentInvalidMethod, message)
            }
            OrderError::Storage(_) => AppError::database(message),
        }
    }
}
