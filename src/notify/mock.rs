//! Scriptable sender for tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::outbox::{NotificationSender, SendError, Transfer, TransferId};

pub struct MockSender {
    /// Transfers in the order their send started
    sent: Mutex<Vec<TransferId>>,
    send_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_concurrent: AtomicUsize,
    /// Configured behavior
    failures: Mutex<HashMap<TransferId, SendError>>,
    fail_all: Mutex<Option<SendError>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            send_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            failures: Mutex::new(HashMap::new()),
            fail_all: Mutex::new(None),
            delay: Mutex::new(None),
        }
    }

    /// Fail every send for `transfer_id` with `error`
    pub fn fail_for(&self, transfer_id: TransferId, error: SendError) {
        self.failures.lock().unwrap().insert(transfer_id, error);
    }

    pub fn set_fail_all(&self, error: Option<SendError>) {
        *self.fail_all.lock().unwrap() = error;
    }

    /// Hold every send for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<TransferId> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Highest number of sends observed running at the same time
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Tx: Sync> NotificationSender<Tx> for MockSender {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, _tx: &Tx, transfer: &Transfer) -> Result<(), SendError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(transfer.id);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failures.lock().unwrap().get(&transfer.id) {
            return Err(error.clone());
        }
        match self.fail_all.lock().unwrap().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
