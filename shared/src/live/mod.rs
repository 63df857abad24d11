//! Storefront live-update protocol types
//!
//! Room-based pub/sub used by the `/ws` endpoint: clients join rooms,
//! the server pushes order events into them.

pub mod ws;

pub use ws::*;
