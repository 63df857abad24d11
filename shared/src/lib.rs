//! Shared types for the storefront
//!
//! Error types, API envelopes, data models and live-update protocol
//! used by shop-server and its clients.

pub mod error;
pub mod live;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
