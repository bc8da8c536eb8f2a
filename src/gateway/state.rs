use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Database;
use crate::outbox::{
    CreateTransferRequest, OutboxError, TransferCreator, TransferId, TransfersRepository,
};

/// Transfer creation as seen by the HTTP layer
///
/// Erases the repository type so handlers are not generic over the store.
#[async_trait]
pub trait TransferService: Send + Sync {
    async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<TransferId, OutboxError>;
}

#[async_trait]
impl<R> TransferService for TransferCreator<R>
where
    R: TransfersRepository + 'static,
{
    async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<TransferId, OutboxError> {
        self.create(request).await
    }
}

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Transfer creation service
    pub transfers: Arc<dyn TransferService>,
    /// PostgreSQL database (None when running on the in-memory store)
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(transfers: Arc<dyn TransferService>, pg_db: Option<Arc<Database>>) -> Self {
        Self { transfers, pg_db }
    }
}
