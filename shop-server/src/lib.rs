//! Storefront order service
//!
//! Catalog, OTP-confirmed checkout, the order status machine with an
//! append-only tracking log, and live notifications over WebSocket rooms
//! and email.
//!
//! ```text
//! shop-server/src/
//! ├── api/        # HTTP routes and handlers
//! ├── auth/       # JWT, argon2, extractor, admin middleware
//! ├── db/         # SQLite pool, migrations, repositories
//! ├── inventory   # atomic stock reservation
//! ├── orders/     # lifecycle manager, OTP policy, errors
//! ├── notify/     # event bus, mailers, background subscribers
//! ├── live/       # room hub and /ws session
//! └── tasks       # background task registry
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod live;
pub mod logger;
pub mod notify;
pub mod orders;
pub mod state;
pub mod tasks;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use config::Config;
pub use orders::{OrderError, OrdersManager};
pub use state::AppState;
pub use tasks::{BackgroundTasks, TaskKind};
