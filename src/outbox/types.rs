//! Outbox Core Types
//!
//! Transfer records and the request used to create them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::NotificationStatus;

/// Transfer identifier - UUID v4
///
/// Also identifies the transfer's notification task (one-to-one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Generate a new random TransferId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TransferId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Account identifier (opaque to the outbox)
pub type AccountId = Uuid;

/// A persisted transfer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    /// Smallest currency unit
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Request to create a transfer
///
/// Amount sign and limits are not checked here; storage constraints
/// (or an upstream validator) own that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: i64,
}

impl CreateTransferRequest {
    pub fn new(from_account: AccountId, to_account: AccountId, amount: i64) -> Self {
        Self {
            from_account,
            to_account,
            amount,
        }
    }

    /// Materialize the transfer this request describes
    pub fn into_transfer(self, id: TransferId, created_at: DateTime<Utc>) -> Transfer {
        Transfer {
            id,
            from_account: self.from_account,
            to_account: self.to_account,
            amount: self.amount,
            created_at,
        }
    }
}

/// Notification task of a transfer, keyed by the transfer's id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTask {
    pub transfer_id: TransferId,
    pub status: NotificationStatus,
    /// Failure reason, set only when FAILED
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTask {
    pub fn pending(transfer_id: TransferId, now: DateTime<Utc>) -> Self {
        Self {
            transfer_id,
            status: NotificationStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
