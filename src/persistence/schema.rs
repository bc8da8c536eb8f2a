//! PostgreSQL schema for transfers and their notification tasks

use sqlx::PgPool;

/// Create tables and indexes if they do not exist yet
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing outbox schema...");

    sqlx::query(CREATE_TRANSFERS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_NOTIFICATION_TASKS_TABLE)
        .execute(pool)
        .await?;
    sqlx::query(CREATE_NOTIFICATION_TASKS_STATUS_INDEX)
        .execute(pool)
        .await?;

    tracing::info!("Outbox schema ready");
    Ok(())
}

const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers_tb (
    id           UUID PRIMARY KEY,
    from_account UUID NOT NULL,
    to_account   UUID NOT NULL,
    amount       BIGINT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// status: 0 PENDING, 10 IN_FLIGHT, 20 COMPLETED, -10 FAILED
const CREATE_NOTIFICATION_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfer_notification_tasks_tb (
    transfer_id   UUID PRIMARY KEY REFERENCES transfers_tb (id),
    status        SMALLINT NOT NULL DEFAULT 0,
    error_message TEXT,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_NOTIFICATION_TASKS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_notification_tasks_status_created
    ON transfer_notification_tasks_tb (status, created_at)
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::NotificationStatus;

    #[test]
    fn test_pending_is_column_default() {
        assert_eq!(NotificationStatus::Pending.id(), 0);
        assert!(CREATE_NOTIFICATION_TASKS_TABLE.contains("status        SMALLINT NOT NULL DEFAULT 0"));
    }

    #[test]
    fn test_statements_are_idempotent() {
        for stmt in [
            CREATE_TRANSFERS_TABLE,
            CREATE_NOTIFICATION_TASKS_TABLE,
            CREATE_NOTIFICATION_TASKS_STATUS_INDEX,
        ] {
            assert!(stmt.contains("IF NOT EXISTS"));
        }
    }
}
