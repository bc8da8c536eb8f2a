//! In-memory outbox store
//!
//! Implements both storage contracts with real transaction semantics:
//! writes are staged in the transaction and only become visible on commit,
//! claims are exclusive across all open transactions, and a transaction
//! dropped without commit behaves like a rollback.
//!
//! Every operation can be made to fail for testing (see the `set_fail_*`
//! methods).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::error::StorageError;
use super::ports::{NotificationsOutbox, Transaction, TransactionalStore, TransfersRepository};
use super::state::NotificationStatus;
use super::types::{CreateTransferRequest, NotificationTask, Transfer, TransferId};

type TxId = u64;

/// Committed rows plus the claim table
#[derive(Default)]
struct StoreState {
    transfers: HashMap<TransferId, Transfer>,
    tasks: HashMap<TransferId, NotificationTask>,
    /// Tasks held by an open transaction
    claims: HashMap<TransferId, TxId>,
}

impl StoreState {
    fn release_claims(&mut self, tx_id: TxId) {
        self.claims.retain(|_, holder| *holder != tx_id);
    }
}

#[derive(Default)]
struct FaultInjection {
    begin: AtomicBool,
    create_transfer: AtomicBool,
    create_task: AtomicBool,
    claim: AtomicBool,
    mark_completed: AtomicBool,
    mark_failed: AtomicBool,
    commit: AtomicBool,
    rollback: AtomicBool,
}

impl FaultInjection {
    fn check(flag: &AtomicBool, op: &str) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Injected(op.to_string()))
        } else {
            Ok(())
        }
    }
}

struct Shared {
    state: Mutex<StoreState>,
    faults: FaultInjection,
    next_tx_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-memory store, cheap to clone (clones share the same data)
#[derive(Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
                faults: FaultInjection::default(),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn set_fail_begin(&self, fail: bool) {
        self.shared.faults.begin.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create_transfer(&self, fail: bool) {
        self.shared
            .faults
            .create_transfer
            .store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create_task(&self, fail: bool) {
        self.shared.faults.create_task.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_claim(&self, fail: bool) {
        self.shared.faults.claim.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_mark_completed(&self, fail: bool) {
        self.shared
            .faults
            .mark_completed
            .store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_mark_failed(&self, fail: bool) {
        self.shared.faults.mark_failed.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.shared.faults.commit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.shared.faults.rollback.store(fail, Ordering::SeqCst);
    }

    // === Committed-state queries ===

    pub fn transfer(&self, id: TransferId) -> Option<Transfer> {
        self.shared.lock().transfers.get(&id).cloned()
    }

    pub fn task(&self, id: TransferId) -> Option<NotificationTask> {
        self.shared.lock().tasks.get(&id).cloned()
    }

    pub fn transfer_count(&self) -> usize {
        self.shared.lock().transfers.len()
    }

    pub fn task_count(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    pub fn tasks_with_status(&self, status: NotificationStatus) -> Vec<NotificationTask> {
        let state = self.shared.lock();
        let mut tasks: Vec<_> = state
            .tasks
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.transfer_id));
        tasks
    }

    /// Number of tasks currently held by open transactions
    pub fn open_claims(&self) -> usize {
        self.shared.lock().claims.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Staged {
    transfers: Vec<Transfer>,
    tasks: Vec<NotificationTask>,
    updates: HashMap<TransferId, (NotificationStatus, Option<String>)>,
}

/// Transaction on an [`InMemoryStore`]
pub struct MemoryTx {
    id: TxId,
    shared: Arc<Shared>,
    staged: Mutex<Staged>,
    finished: bool,
}

impl MemoryTx {
    fn staged(&self) -> MutexGuard<'_, Staged> {
        self.staged.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current status of a task as seen from inside this transaction
    fn visible_status(
        &self,
        state: &StoreState,
        staged: &Staged,
        transfer_id: TransferId,
    ) -> Option<NotificationStatus> {
        staged
            .updates
            .get(&transfer_id)
            .map(|(status, _)| *status)
            .or_else(|| state.tasks.get(&transfer_id).map(|t| t.status))
    }

    fn mark(
        &self,
        transfer_id: TransferId,
        next: NotificationStatus,
        reason: Option<&str>,
    ) -> Result<(), StorageError> {
        let state = self.shared.lock();
        if state.claims.get(&transfer_id) != Some(&self.id) {
            return Err(StorageError::InvalidState(format!(
                "task {} is not claimed by this transaction",
                transfer_id
            )));
        }

        let mut staged = self.staged();
        let current = self
            .visible_status(&state, &staged, transfer_id)
            .ok_or(StorageError::NotFound(transfer_id))?;
        if !current.can_transition_to(next) {
            return Err(StorageError::InvalidState(format!(
                "{} -> {} for task {}",
                current, next, transfer_id
            )));
        }

        staged
            .updates
            .insert(transfer_id, (next, reason.map(str::to_string)));
        Ok(())
    }

    fn finish(mut self) -> TxId {
        self.finished = true;
        self.shared.lock().release_claims(self.id);
        self.id
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            debug!(tx_id = self.id, "Transaction dropped without commit");
            self.shared.lock().release_claims(self.id);
        }
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(self) -> Result<(), StorageError> {
        if let Err(e) = FaultInjection::check(&self.shared.faults.commit, "commit") {
            // A failed commit aborts the transaction
            self.finish();
            return Err(e);
        }

        {
            let mut state = self.shared.lock();
            let mut staged = self.staged();
            let now = Utc::now();

            for transfer in staged.transfers.drain(..) {
                state.transfers.insert(transfer.id, transfer);
            }
            for task in staged.tasks.drain(..) {
                state.tasks.insert(task.transfer_id, task);
            }
            for (transfer_id, (status, error)) in staged.updates.drain() {
                if let Some(task) = state.tasks.get_mut(&transfer_id) {
                    task.status = status;
                    task.error = error;
                    task.updated_at = now;
                }
            }
        }

        let tx_id = self.finish();
        debug!(tx_id, "Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        let result = FaultInjection::check(&self.shared.faults.rollback, "rollback");
        // Claims are released either way; the store never keeps a dead transaction
        let tx_id = self.finish();
        debug!(tx_id, "Transaction rolled back");
        result
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StorageError> {
        FaultInjection::check(&self.shared.faults.begin, "begin")?;
        Ok(MemoryTx {
            id: self.shared.next_tx_id.fetch_add(1, Ordering::SeqCst),
            shared: self.shared.clone(),
            staged: Mutex::new(Staged::default()),
            finished: false,
        })
    }
}

#[async_trait]
impl TransfersRepository for InMemoryStore {
    async fn create_transfer(
        &self,
        tx: &MemoryTx,
        request: &CreateTransferRequest,
    ) -> Result<TransferId, StorageError> {
        FaultInjection::check(&self.shared.faults.create_transfer, "create_transfer")?;

        let id = TransferId::new();
        let transfer = request.clone().into_transfer(id, Utc::now());
        tx.staged().transfers.push(transfer);
        Ok(id)
    }

    async fn create_notification_task(
        &self,
        tx: &MemoryTx,
        transfer_id: TransferId,
    ) -> Result<(), StorageError> {
        FaultInjection::check(&self.shared.faults.create_task, "create_notification_task")?;

        let state = self.shared.lock();
        let mut staged = tx.staged();

        let transfer_visible = staged.transfers.iter().any(|t| t.id == transfer_id)
            || state.transfers.contains_key(&transfer_id);
        if !transfer_visible {
            return Err(StorageError::NotFound(transfer_id));
        }

        let task_exists = staged.tasks.iter().any(|t| t.transfer_id == transfer_id)
            || state.tasks.contains_key(&transfer_id);
        if task_exists {
            return Err(StorageError::InvalidState(format!(
                "notification task for {} already exists",
                transfer_id
            )));
        }

        staged
            .tasks
            .push(NotificationTask::pending(transfer_id, Utc::now()));
        Ok(())
    }
}

#[async_trait]
impl NotificationsOutbox for InMemoryStore {
    async fn claim_unsent_notification_tasks(
        &self,
        tx: &MemoryTx,
        limit: u32,
    ) -> Result<Vec<Transfer>, StorageError> {
        FaultInjection::check(&self.shared.faults.claim, "claim")?;

        // Selection and claim happen under one lock: no other transaction
        // can observe the task as claimable in between.
        let mut state = self.shared.lock();
        let mut candidates: Vec<&NotificationTask> = state
            .tasks
            .values()
            .filter(|t| t.status == NotificationStatus::Pending)
            .filter(|t| !state.claims.contains_key(&t.transfer_id))
            .collect();
        candidates.sort_by_key(|t| (t.created_at, t.transfer_id));

        let claimed: Vec<TransferId> = candidates
            .into_iter()
            .take(limit as usize)
            .map(|t| t.transfer_id)
            .collect();

        let mut transfers = Vec::with_capacity(claimed.len());
        let mut staged = tx.staged();
        for transfer_id in claimed {
            let transfer = state
                .transfers
                .get(&transfer_id)
                .cloned()
                .ok_or(StorageError::NotFound(transfer_id))?;
            state.claims.insert(transfer_id, tx.id);
            staged
                .updates
                .insert(transfer_id, (NotificationStatus::InFlight, None));
            transfers.push(transfer);
        }

        Ok(transfers)
    }

    async fn mark_notification_completed(
        &self,
        tx: &MemoryTx,
        transfer_id: TransferId,
    ) -> Result<(), StorageError> {
        FaultInjection::check(&self.shared.faults.mark_completed, "mark_completed")?;
        tx.mark(transfer_id, NotificationStatus::Completed, None)
    }

    async fn mark_notification_failed(
        &self,
        tx: &MemoryTx,
        transfer_id: TransferId,
        reason: &str,
    ) -> Result<(), StorageError> {
        FaultInjection::check(&self.shared.faults.mark_failed, "mark_failed")?;
        tx.mark(transfer_id, NotificationStatus::Failed, Some(reason))
    }
}
