//! Outbox Payment Service
//!
//! Usage:
//!   outbox_payment_service [--env <name>] [--port <port>] [--in-memory]
//!
//! `--env` selects `config/<name>.yaml` (default `dev`). `--in-memory` ignores
//! `postgres_url` and keeps all state in process.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use outbox_payment_service::config::{AppConfig, DispatcherConfig};
use outbox_payment_service::db::Database;
use outbox_payment_service::gateway::{self, AppState};
use outbox_payment_service::logging;
use outbox_payment_service::notify::{LogSender, WebhookSender};
use outbox_payment_service::outbox::{
    DispatchWorker, InMemoryStore, NotificationDispatcher, NotificationSender,
    NotificationsOutbox, TransferCreator, TransfersRepository, WorkerConfig,
};
use outbox_payment_service::persistence::{PgOutboxStore, init_schema};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn use_in_memory() -> bool {
    std::env::args().any(|a| a == "--in-memory")
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config =
        AppConfig::load(&env).with_context(|| format!("load configuration for env '{}'", env))?;
    let _log_guard = logging::init_logging(&app_config);

    tracing::info!(
        git_hash = env!("GIT_HASH"),
        "Starting outbox payment service in {} mode",
        env
    );

    match app_config.postgres_url.as_deref() {
        Some(url) if !use_in_memory() => {
            let db = Arc::new(
                Database::connect(url)
                    .await
                    .context("connect to PostgreSQL")?,
            );
            init_schema(db.pool())
                .await
                .context("initialize outbox schema")?;
            let store = Arc::new(PgOutboxStore::new(db.pool().clone()));
            run(&app_config, store, Some(db)).await
        }
        _ => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            run(&app_config, Arc::new(InMemoryStore::new()), None).await
        }
    }
}

/// Start the dispatcher and gateway on `store`, then wait for ctrl-c
async fn run<R>(config: &AppConfig, store: Arc<R>, pg_db: Option<Arc<Database>>) -> anyhow::Result<()>
where
    R: TransfersRepository + NotificationsOutbox + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = if config.dispatcher.enabled {
        let handle = match config.notifier.endpoint.as_deref() {
            Some(endpoint) => {
                let sender = WebhookSender::new(endpoint, config.notifier.timeout())
                    .context("build webhook client")?;
                tracing::info!("Notifications delivered to {}", endpoint);
                spawn_worker(store.clone(), Arc::new(sender), &config.dispatcher, shutdown_rx.clone())
            }
            None => {
                tracing::warn!("No notifier endpoint configured; notifications are only logged");
                spawn_worker(store.clone(), Arc::new(LogSender), &config.dispatcher, shutdown_rx.clone())
            }
        };
        Some(handle)
    } else {
        tracing::warn!("Dispatcher disabled; notification tasks stay PENDING");
        None
    };

    let state = Arc::new(AppState::new(
        Arc::new(TransferCreator::new(store)),
        pg_db,
    ));

    let port = get_port_override().unwrap_or(config.gateway.port);
    let addr = format!("{}:{}", config.gateway.host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind gateway to {} (port in use?)", addr))?;
    let mut server = tokio::spawn(gateway::run_server(listener, state, shutdown_rx));

    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for ctrl-c")?;
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
            server.await
        }
        exited = &mut server => {
            tracing::error!("Gateway exited unexpectedly");
            let _ = shutdown_tx.send(true);
            exited
        }
    };

    if let Some(worker) = worker {
        worker.await.context("dispatch worker panicked")?;
    }
    server_result.context("gateway task panicked")??;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn spawn_worker<O, S>(
    outbox: Arc<O>,
    sender: Arc<S>,
    config: &DispatcherConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    O: NotificationsOutbox + 'static,
    S: NotificationSender<O::Tx> + 'static,
{
    let dispatcher = Arc::new(NotificationDispatcher::new(
        outbox,
        sender,
        config.claim_limit,
    ));
    let worker = DispatchWorker::new(
        dispatcher,
        WorkerConfig {
            interval: config.interval(),
        },
    );
    tokio::spawn(async move { worker.run(shutdown).await })
}
