//! HTTP Gateway
//!
//! - `POST /api/v1/transfers`: create a transfer
//! - `GET /api/v1/health`: liveness plus database ping
//! - `GET /api-docs/openapi.json`: OpenAPI document

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use utoipa::OpenApi;

pub use state::{AppState, TransferService};

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/transfers", post(handlers::create_transfer))
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
}

/// Serve the gateway on `listener` until `shutdown` flips to true
pub async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("Gateway shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::{InMemoryStore, TransferCreator, TransferId};
    use serde_json::{Value, json};

    async fn spawn(store: InMemoryStore) -> (String, watch::Sender<bool>) {
        let creator = TransferCreator::new(Arc::new(store));
        let state = Arc::new(AppState::new(Arc::new(creator), None));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = watch::channel(false);
        tokio::spawn(run_server(listener, state, rx));
        (base, tx)
    }

    fn body() -> Value {
        json!({
            "from_account": uuid::Uuid::new_v4(),
            "to_account": uuid::Uuid::new_v4(),
            "amount": 1500
        })
    }

    #[tokio::test]
    async fn test_create_transfer_returns_201() {
        let store = InMemoryStore::new();
        let (base, _shutdown) = spawn(store.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/api/v1/transfers", base))
            .json(&body())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 201);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["msg"], "ok");
        let id: TransferId = json["data"]["transfer_id"].as_str().unwrap().parse().unwrap();
        assert_eq!(store.transfer(id).unwrap().amount, 1500);
        assert!(store.task(id).is_some());
    }

    #[tokio::test]
    async fn test_create_transfer_store_failure_returns_500() {
        let store = InMemoryStore::new();
        store.set_fail_create_task(true);
        let (base, _shutdown) = spawn(store.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/api/v1/transfers", base))
            .json(&body())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 500);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["code"], types::error_codes::INTERNAL_ERROR);
        assert!(json.get("data").is_none());
        assert_eq!(store.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (base, _shutdown) = spawn(InMemoryStore::new()).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/api/v1/transfers", base))
            .header("content-type", "application/json")
            .body("{\"amount\": \"lots\"}")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 400);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["code"], types::error_codes::INVALID_PARAMETER);
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let (base, _shutdown) = spawn(InMemoryStore::new()).await;

        let resp = reqwest::get(format!("{}/api/v1/health", base)).await.unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        let json: Value = resp.json().await.unwrap();
        assert!(json["data"]["timestamp_ms"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_openapi_served() {
        let (base, _shutdown) = spawn(InMemoryStore::new()).await;

        let resp = reqwest::get(format!("{}/api-docs/openapi.json", base))
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        let json: Value = resp.json().await.unwrap();
        assert!(json["paths"]["/api/v1/transfers"].is_object());
    }
}
