//! Notification transports
//!
//! Implementations of [`crate::outbox::NotificationSender`]. None of them
//! touch the transaction they are handed.

pub mod log;
#[cfg(any(test, feature = "mock-api"))]
pub mod mock;
pub mod webhook;

pub use log::LogSender;
#[cfg(any(test, feature = "mock-api"))]
pub use mock::MockSender;
pub use webhook::WebhookSender;
