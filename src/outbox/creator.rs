//! Transfer Creator
//!
//! Writes a transfer and its PENDING notification task in one transaction.

use std::sync::Arc;

use tracing::{error, info};

use super::error::OutboxError;
use super::ports::{Transaction, TransfersRepository};
use super::types::{CreateTransferRequest, TransferId};

pub struct TransferCreator<R> {
    repository: Arc<R>,
}

impl<R: TransfersRepository> TransferCreator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a transfer together with its notification task
    ///
    /// Either both rows are committed or neither is. Errors after `begin`
    /// roll the transaction back; a failing rollback is returned alongside
    /// the original error.
    pub async fn create(&self, request: CreateTransferRequest) -> Result<TransferId, OutboxError> {
        let tx = self
            .repository
            .begin()
            .await
            .map_err(OutboxError::Begin)?;

        let inserted = self.insert(&tx, &request).await;
        match inserted {
            Ok(transfer_id) => {
                tx.commit().await.map_err(OutboxError::Commit)?;
                info!(
                    transfer_id = %transfer_id,
                    amount = request.amount,
                    "Transfer created: {} -> {}", request.from_account, request.to_account
                );
                Ok(transfer_id)
            }
            Err(e) => Err(rollback(tx, e).await),
        }
    }

    async fn insert(
        &self,
        tx: &R::Tx,
        request: &CreateTransferRequest,
    ) -> Result<TransferId, OutboxError> {
        let transfer_id = self
            .repository
            .create_transfer(tx, request)
            .await
            .map_err(OutboxError::CreateTransfer)?;

        self.repository
            .create_notification_task(tx, transfer_id)
            .await
            .map_err(OutboxError::CreateNotificationTask)?;

        Ok(transfer_id)
    }
}

/// Roll back after `cause`, combining both errors if the rollback fails
pub(crate) async fn rollback<T: Transaction>(tx: T, cause: OutboxError) -> OutboxError {
    match tx.rollback().await {
        Ok(()) => cause,
        Err(rollback_err) => {
            error!(error = %cause, rollback_error = %rollback_err, "Rollback failed");
            cause.with_rollback_error(rollback_err)
        }
    }
}
