//! Log-only sender for local runs without a webhook endpoint

use async_trait::async_trait;
use tracing::info;

use crate::outbox::{NotificationSender, SendError, Transfer};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

#[async_trait]
impl<Tx: Sync> NotificationSender<Tx> for LogSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, _tx: &Tx, transfer: &Transfer) -> Result<(), SendError> {
        info!(
            transfer_id = %transfer.id,
            from_account = %transfer.from_account,
            to_account = %transfer.to_account,
            amount = transfer.amount,
            "Transfer notification"
        );
        Ok(())
    }
}
