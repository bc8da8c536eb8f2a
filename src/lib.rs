//! Outbox Payment Service
//!
//! Creates transfers and notifies external parties about them through a
//! transactional outbox: the transfer and its notification task are written
//! in one transaction, and a background dispatcher delivers pending
//! notifications at least once.
//!
//! # Modules
//!
//! - [`outbox`] - Core types, ports, TransferCreator, NotificationDispatcher
//! - [`notify`] - Notification transports (webhook, log)
//! - [`persistence`] - PostgreSQL outbox store and schema
//! - [`gateway`] - HTTP API
//! - [`config`] / [`logging`] / [`db`] - Process plumbing

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod outbox;
pub mod persistence;

// Convenient re-exports at crate root
pub use outbox::{
    CreateTransferRequest, DispatchReport, DispatchWorker, InMemoryStore, NotificationDispatcher,
    NotificationSender, NotificationStatus, NotificationsOutbox, OutboxError, SendError,
    StorageError, Transaction, TransactionalStore, Transfer, TransferCreator, TransferId,
    TransfersRepository, WorkerConfig,
};
