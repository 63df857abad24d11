//! Data models
//!
//! Shared between shop-server and the storefront frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes.

pub mod order;
pub mod product;
pub mod site_settings;
pub mod user;

pub use order::*;
pub use product::*;
pub use site_settings::*;
pub use user::*;
