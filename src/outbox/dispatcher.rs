//! Notification Dispatcher
//!
//! One dispatch cycle:
//!
//! ```text
//! BEGIN → claim ≤ N PENDING → send all concurrently → mark each outcome → COMMIT
//! ```
//!
//! Claim failure rolls back (tasks stay PENDING). Send failures are
//! recorded as FAILED tasks. Marking failures are logged and counted but
//! never abort the batch. Delivery is at-least-once: if the commit fails
//! after a successful send, the task is PENDING again and will be resent.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::creator::rollback;
use super::error::OutboxError;
use super::ports::{NotificationSender, NotificationsOutbox, Transaction};
use super::types::Transfer;

/// Summary of one dispatch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Outcomes that could not be recorded
    pub mark_errors: usize,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.claimed == 0
    }

    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Completed => self.completed += 1,
            Delivery::Failed => self.failed += 1,
            Delivery::Unrecorded => self.mark_errors += 1,
        }
    }
}

/// Outcome of one send plus its bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Completed,
    Failed,
    Unrecorded,
}

pub struct NotificationDispatcher<O, S> {
    outbox: Arc<O>,
    sender: Arc<S>,
    claim_limit: u32,
}

impl<O, S> NotificationDispatcher<O, S>
where
    O: NotificationsOutbox,
    S: NotificationSender<O::Tx>,
{
    pub fn new(outbox: Arc<O>, sender: Arc<S>, claim_limit: u32) -> Self {
        Self {
            outbox,
            sender,
            claim_limit,
        }
    }

    pub fn claim_limit(&self) -> u32 {
        self.claim_limit
    }

    /// Run one dispatch cycle
    pub async fn dispatch(&self) -> Result<DispatchReport, OutboxError> {
        let tx = self.outbox.begin().await.map_err(OutboxError::Begin)?;

        let claimed = self
            .outbox
            .claim_unsent_notification_tasks(&tx, self.claim_limit)
            .await;
        let transfers = match claimed {
            Ok(transfers) => transfers,
            Err(e) => return Err(rollback(tx, OutboxError::Claim(e)).await),
        };

        let mut report = DispatchReport {
            claimed: transfers.len(),
            ..DispatchReport::default()
        };

        if !transfers.is_empty() {
            debug!(
                count = transfers.len(),
                sender = self.sender.name(),
                "Dispatching claimed notifications"
            );
        }

        // Each unit owns its send and its marking; none can cancel another
        let deliveries = join_all(transfers.iter().map(|t| self.deliver(&tx, t))).await;
        for delivery in deliveries {
            report.record(delivery);
        }

        tx.commit().await.map_err(OutboxError::Commit)?;

        Ok(report)
    }

    async fn deliver(&self, tx: &O::Tx, transfer: &Transfer) -> Delivery {
        match self.sender.send(tx, transfer).await {
            Ok(()) => match self
                .outbox
                .mark_notification_completed(tx, transfer.id)
                .await
            {
                Ok(()) => Delivery::Completed,
                Err(e) => {
                    error!(
                        transfer_id = %transfer.id,
                        error = %e,
                        "Cannot mark notification task as completed"
                    );
                    Delivery::Unrecorded
                }
            },
            Err(send_err) => {
                let reason = send_err.to_string();
                warn!(
                    transfer_id = %transfer.id,
                    error = %reason,
                    "Notification send failed"
                );
                match self
                    .outbox
                    .mark_notification_failed(tx, transfer.id, &reason)
                    .await
                {
                    Ok(()) => Delivery::Failed,
                    Err(e) => {
                        error!(
                            transfer_id = %transfer.id,
                            error = %e,
                            "Cannot mark notification task as failed"
                        );
                        Delivery::Unrecorded
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockSender;
    use crate::outbox::creator::TransferCreator;
    use crate::outbox::error::SendError;
    use crate::outbox::memory::InMemoryStore;
    use crate::outbox::state::NotificationStatus;
    use crate::outbox::types::{CreateTransferRequest, TransferId};
    use uuid::Uuid;

    struct TestHarness {
        store: InMemoryStore,
        creator: TransferCreator<InMemoryStore>,
        dispatcher: NotificationDispatcher<InMemoryStore, MockSender>,
        sender: Arc<MockSender>,
    }

    impl TestHarness {
        fn new(limit: u32) -> Self {
            let store = InMemoryStore::new();
            let sender = Arc::new(MockSender::new());
            Self {
                creator: TransferCreator::new(Arc::new(store.clone())),
                dispatcher: NotificationDispatcher::new(
                    Arc::new(store.clone()),
                    sender.clone(),
                    limit,
                ),
                store,
                sender,
            }
        }

        async fn create(&self, n: usize) -> Vec<TransferId> {
            let mut ids = Vec::with_capacity(n);
            for _ in 0..n {
                let req = CreateTransferRequest::new(Uuid::new_v4(), Uuid::new_v4(), 500);
                ids.push(self.creator.create(req).await.unwrap());
            }
            ids
        }

        fn status(&self, id: TransferId) -> NotificationStatus {
            self.store.task(id).unwrap().status
        }
    }

    #[tokio::test]
    async fn test_dispatch_marks_completed() {
        let h = TestHarness::new(10);
        let ids = h.create(1).await;

        let report = h.dispatcher.dispatch().await.unwrap();

        assert_eq!(report.claimed, 1);
        assert_eq!(report.completed, 1);
        assert_eq!(h.status(ids[0]), NotificationStatus::Completed);
        assert_eq!(h.sender.sent(), ids);
    }

    #[tokio::test]
    async fn test_dispatch_with_nothing_pending_is_noop() {
        let h = TestHarness::new(10);

        let report = h.dispatcher.dispatch().await.unwrap();

        assert!(report.is_empty());
        assert_eq!(report, DispatchReport::default());
        assert_eq!(h.sender.send_count(), 0);
    }

    #[tokio::test]
    async fn test_second_dispatch_claims_nothing() {
        let h = TestHarness::new(10);
        h.create(3).await;

        assert_eq!(h.dispatcher.dispatch().await.unwrap().completed, 3);
        assert!(h.dispatcher.dispatch().await.unwrap().is_empty());
        assert_eq!(h.sender.send_count(), 3);
    }

    #[tokio::test]
    async fn test_send_failure_recorded_with_reason() {
        let h = TestHarness::new(10);
        let ids = h.create(1).await;
        h.sender
            .fail_for(ids[0], SendError::Unreachable("endpoint unreachable".into()));

        let report = h.dispatcher.dispatch().await.unwrap();

        assert_eq!(report.failed, 1);
        let task = h.store.task(ids[0]).unwrap();
        assert_eq!(task.status, NotificationStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("endpoint unreachable"));

        // FAILED is not PENDING: never re-claimed
        assert!(h.dispatcher.dispatch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_isolated_from_siblings() {
        let h = TestHarness::new(10);
        let ids = h.create(4).await;
        h.sender
            .fail_for(ids[1], SendError::Transport("connection refused".into()));

        let report = h.dispatcher.dispatch().await.unwrap();

        assert_eq!(report.completed, 3);
        assert_eq!(report.failed, 1);
        for (i, id) in ids.iter().enumerate() {
            let expected = if i == 1 {
                NotificationStatus::Failed
            } else {
                NotificationStatus::Completed
            };
            assert_eq!(h.status(*id), expected);
        }
    }

    #[tokio::test]
    async fn test_claim_limit_bounds_batch() {
        let h = TestHarness::new(2);
        h.create(5).await;

        assert_eq!(h.dispatcher.dispatch().await.unwrap().claimed, 2);
        assert_eq!(h.dispatcher.dispatch().await.unwrap().claimed, 2);
        assert_eq!(h.dispatcher.dispatch().await.unwrap().claimed, 1);
        assert!(h.dispatcher.dispatch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_failure_rolls_back() {
        let h = TestHarness::new(10);
        let ids = h.create(1).await;
        h.store.set_fail_claim(true);

        let err = h.dispatcher.dispatch().await.unwrap_err();

        assert!(matches!(err, OutboxError::Claim(_)));
        assert!(err.to_string().starts_with("cannot claim unsent notifications"));
        assert_eq!(h.status(ids[0]), NotificationStatus::Pending);
        assert_eq!(h.store.open_claims(), 0);
    }

    #[tokio::test]
    async fn test_claim_and_rollback_failure_combined() {
        let h = TestHarness::new(10);
        h.create(1).await;
        h.store.set_fail_claim(true);
        h.store.set_fail_rollback(true);

        let err = h.dispatcher.dispatch().await.unwrap_err();
        assert!(matches!(err, OutboxError::RolledBackWithError { .. }));
        assert!(matches!(err.cause(), OutboxError::Claim(_)));
    }

    #[tokio::test]
    async fn test_begin_failure() {
        let h = TestHarness::new(10);
        h.store.set_fail_begin(true);

        let err = h.dispatcher.dispatch().await.unwrap_err();
        assert!(matches!(err, OutboxError::Begin(_)));
    }

    #[tokio::test]
    async fn test_mark_failure_does_not_fail_dispatch() {
        let h = TestHarness::new(10);
        let ids = h.create(2).await;
        h.store.set_fail_mark_completed(true);

        let report = h.dispatcher.dispatch().await.unwrap();

        assert_eq!(report.claimed, 2);
        assert_eq!(report.mark_errors, 2);
        assert_eq!(h.sender.send_count(), 2);
        // Claimed but unrecorded: left IN_FLIGHT after commit
        assert_eq!(h.status(ids[0]), NotificationStatus::InFlight);
    }

    #[tokio::test]
    async fn test_failed_mark_of_failed_send_spares_sibling() {
        let h = TestHarness::new(10);
        let ids = h.create(2).await;
        h.sender
            .fail_for(ids[0], SendError::Unreachable("endpoint unreachable".into()));
        h.store.set_fail_mark_failed(true);

        let report = h.dispatcher.dispatch().await.unwrap();

        assert_eq!(report.claimed, 2);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.mark_errors, 1);
        assert_eq!(h.status(ids[0]), NotificationStatus::InFlight);
        assert_eq!(h.status(ids[1]), NotificationStatus::Completed);
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_tasks_pending() {
        let h = TestHarness::new(10);
        let ids = h.create(1).await;
        h.store.set_fail_commit(true);

        let err = h.dispatcher.dispatch().await.unwrap_err();
        assert!(matches!(err, OutboxError::Commit(_)));
        assert_eq!(h.status(ids[0]), NotificationStatus::Pending);

        // Sent once already; the retry sends again (at-least-once)
        h.store.set_fail_commit(false);
        assert_eq!(h.dispatcher.dispatch().await.unwrap().completed, 1);
        assert_eq!(h.sender.send_count(), 2);
    }

    #[tokio::test]
    async fn test_sends_run_concurrently() {
        let h = TestHarness::new(10);
        h.create(5).await;
        h.sender.set_delay(std::time::Duration::from_millis(20));

        h.dispatcher.dispatch().await.unwrap();

        assert_eq!(h.sender.max_concurrent(), 5);
    }
}
