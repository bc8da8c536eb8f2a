//! PostgreSQL persistence for the outbox

pub mod postgres;
pub mod schema;

pub use postgres::{PgOutboxStore, PgTx};
pub use schema::init_schema;
