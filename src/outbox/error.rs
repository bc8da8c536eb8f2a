//! Outbox Error Types
//!
//! Three layers: storage errors from adapters, send errors from the
//! transport, and the `OutboxError` the two entrypoints return.

use thiserror::Error;

use super::types::TransferId;

/// Errors raised by a storage adapter
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Notification task not found: {0}")]
    NotFound(TransferId),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Errors raised by a notification sender
///
/// Routine: the dispatcher records them as task failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("endpoint rejected notification with status {status}")]
    Rejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SendError::Rejected {
                status: status.as_u16(),
            },
            None => SendError::Transport(e.to_string()),
        }
    }
}

/// Error returned by `TransferCreator::create` and `NotificationDispatcher::dispatch`
#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("cannot begin transaction: {0}")]
    Begin(#[source] StorageError),

    #[error("cannot create transfer: {0}")]
    CreateTransfer(#[source] StorageError),

    #[error("cannot create notification task: {0}")]
    CreateNotificationTask(#[source] StorageError),

    #[error("cannot claim unsent notifications: {0}")]
    Claim(#[source] StorageError),

    #[error("cannot commit transaction: {0}")]
    Commit(#[source] StorageError),

    /// The original failure plus the rollback that failed after it
    #[error("{cause}; rollback failed: {rollback}")]
    RolledBackWithError {
        cause: Box<OutboxError>,
        rollback: StorageError,
    },
}

impl OutboxError {
    /// Stable code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            OutboxError::Begin(_) => "BEGIN_FAILED",
            OutboxError::CreateTransfer(_) => "CREATE_TRANSFER_FAILED",
            OutboxError::CreateNotificationTask(_) => "CREATE_NOTIFICATION_TASK_FAILED",
            OutboxError::Claim(_) => "CLAIM_FAILED",
            OutboxError::Commit(_) => "COMMIT_FAILED",
            OutboxError::RolledBackWithError { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Attach a failed rollback to this error
    pub fn with_rollback_error(self, rollback: StorageError) -> Self {
        OutboxError::RolledBackWithError {
            cause: Box::new(self),
            rollback,
        }
    }

    /// The error that started the failure, ignoring any rollback error
    pub fn cause(&self) -> &OutboxError {
        match self {
            OutboxError::RolledBackWithError { cause, .. } => cause.cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = OutboxError::Begin(StorageError::Unavailable("pool closed".into()));
        assert_eq!(
            err.to_string(),
            "cannot begin transaction: Storage unavailable: pool closed"
        );

        let err = OutboxError::Claim(StorageError::Injected("claim".into()));
        assert!(err.to_string().starts_with("cannot claim unsent notifications"));
    }

    #[test]
    fn test_rollback_error_keeps_both() {
        let err = OutboxError::CreateTransfer(StorageError::Injected("insert".into()))
            .with_rollback_error(StorageError::Unavailable("connection reset".into()));

        let msg = err.to_string();
        assert!(msg.contains("cannot create transfer"));
        assert!(msg.contains("rollback failed"));
        assert!(msg.contains("connection reset"));
        assert_eq!(err.code(), "ROLLBACK_FAILED");
        assert!(matches!(err.cause(), OutboxError::CreateTransfer(_)));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            OutboxError::Commit(StorageError::Unavailable("x".into())).code(),
            "COMMIT_FAILED"
        );
        assert_eq!(
            OutboxError::CreateNotificationTask(StorageError::Unavailable("x".into())).code(),
            "CREATE_NOTIFICATION_TASK_FAILED"
        );
    }

    #[test]
    fn test_send_error_display_is_reason() {
        let err = SendError::Unreachable("endpoint unreachable".into());
        assert_eq!(err.to_string(), "endpoint unreachable");
        assert_eq!(
            SendError::Rejected { status: 502 }.to_string(),
            "endpoint rejected notification with status 502"
        );
    }
}
