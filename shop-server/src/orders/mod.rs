//! Order lifecycle
//!
//! - [`OrdersManager`]: commands (create, verify, resend, status, cancel) and queries
//! - [`otp`]: confirmation code policy
//! - [`OrderError`]: lifecycle error taxonomy

mod error;
mod manager;
pub mod otp;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use manager::OrdersManager;
pub use otp::OtpPolicy;
