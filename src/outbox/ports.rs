//! Storage and transport contracts consumed by the outbox core
//!
//! Every storage call takes the transaction explicitly. A transaction is
//! owned by the invocation that opened it and consumed by `commit` or
//! `rollback`.

use async_trait::async_trait;

use super::error::{SendError, StorageError};
use super::types::{CreateTransferRequest, Transfer, TransferId};

/// A unit of work against the durable store
#[async_trait]
pub trait Transaction: Send + Sync {
    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}

/// A store that can open transactions
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, StorageError>;
}

/// Write side used by `TransferCreator`
#[async_trait]
pub trait TransfersRepository: TransactionalStore {
    /// Insert the transfer and return its new id
    async fn create_transfer(
        &self,
        tx: &Self::Tx,
        request: &CreateTransferRequest,
    ) -> Result<TransferId, StorageError>;

    /// Insert the transfer's notification task in PENDING
    async fn create_notification_task(
        &self,
        tx: &Self::Tx,
        transfer_id: TransferId,
    ) -> Result<(), StorageError>;
}

/// Task side used by `NotificationDispatcher`
#[async_trait]
pub trait NotificationsOutbox: TransactionalStore {
    /// Claim up to `limit` PENDING tasks and return their transfers
    ///
    /// # Atomicity
    /// Claimed tasks must leave PENDING inside `tx`, and no other open
    /// transaction may claim the same task. This is the only cross-process
    /// safety mechanism of the outbox.
    async fn claim_unsent_notification_tasks(
        &self,
        tx: &Self::Tx,
        limit: u32,
    ) -> Result<Vec<Transfer>, StorageError>;

    async fn mark_notification_completed(
        &self,
        tx: &Self::Tx,
        transfer_id: TransferId,
    ) -> Result<(), StorageError>;

    async fn mark_notification_failed(
        &self,
        tx: &Self::Tx,
        transfer_id: TransferId,
        reason: &str,
    ) -> Result<(), StorageError>;
}

/// Notification transport
///
/// May read through `tx` but must never commit or roll it back.
#[async_trait]
pub trait NotificationSender<Tx: Sync>: Send + Sync {
    /// Sender name for logging
    fn name(&self) -> &'static str;

    async fn send(&self, tx: &Tx, transfer: &Transfer) -> Result<(), SendError>;
}
