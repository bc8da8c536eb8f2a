//! HTTP webhook sender
//!
//! POSTs each transfer as JSON to a configured endpoint. Any non-2xx
//! status is a failed delivery.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::outbox::{NotificationSender, SendError, Transfer, TransferId};

/// Webhook payload
#[derive(Debug, Serialize)]
pub struct TransferNotification {
    pub transfer_id: TransferId,
    pub from_account: uuid::Uuid,
    pub to_account: uuid::Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Transfer> for TransferNotification {
    fn from(t: &Transfer) -> Self {
        Self {
            transfer_id: t.id,
            from_account: t.from_account,
            to_account: t.to_account,
            amount: t.amount,
            created_at: t.created_at,
        }
    }
}

pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookSender {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SendError> {
        let endpoint = endpoint.into();
        info!(endpoint = %endpoint, timeout_ms = timeout.as_millis() as u64, "Initializing webhook sender");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl<Tx: Sync> NotificationSender<Tx> for WebhookSender {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, _tx: &Tx, transfer: &Transfer) -> Result<(), SendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TransferNotification::from(transfer))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    SendError::Unreachable(format!("endpoint unreachable: {}", e))
                } else {
                    SendError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(transfer_id = %transfer.id, status = status.as_u16(), "Webhook delivered");
        Ok(())
    }
}
