//! Transfer Notification Outbox
//!
//! Notifies external parties about transfers without a distributed
//! transaction between the store and the notification channel.
//!
//! # Architecture
//!
//! ```text
//! TransferCreator ──(one tx: transfer + PENDING task)──▶ store
//!                                                          │
//! NotificationDispatcher ◀──(claim ≤ N PENDING in tx)──────┘
//!        │
//!        └──▶ NotificationSender (concurrent) ──▶ mark COMPLETED / FAILED ──▶ COMMIT
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Atomic Create**: a transfer never exists without its notification task
//! 2. **Exclusive Claim**: a PENDING task is claimed by at most one open transaction
//! 3. **At-Least-Once**: a task is never lost; it may be sent again if the
//!    dispatch commit fails after a successful send
//! 4. **Send Isolation**: one failed send never affects its siblings

pub mod creator;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod ports;
pub mod state;
pub mod types;
pub mod worker;

pub use creator::TransferCreator;
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::{OutboxError, SendError, StorageError};
pub use memory::{InMemoryStore, MemoryTx};
pub use ports::{
    NotificationSender, NotificationsOutbox, Transaction, TransactionalStore, TransfersRepository,
};
pub use state::NotificationStatus;
pub use types::{AccountId, CreateTransferRequest, NotificationTask, Transfer, TransferId};
pub use worker::{DispatchWorker, WorkerConfig};
