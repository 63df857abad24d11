//! Notification dispatcher
//!
//! Order lifecycle steps publish to the [`OrderEventBus`]; background
//! workers turn events into live room messages and emails. Delivery is
//! best-effort: failures are logged, never retried, never surfaced to the
//! request that caused them.

pub mod bus;
pub mod email;
pub mod worker;

pub use bus::{OrderEvent, OrderEventBus, OrderPlaced, OrderTransitioned};
pub use email::{EmailTemplate, LogMailer, MailError, Mailer, RecordingMailer, SentEmail, SesMailer, send_in_background};
pub use worker::{dispatch_to_rooms, spawn_workers};
