//! Orchestrates startup and shutdown of the store, queue, worker pool,
//! sweeper, and recovery loader.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::watch;

use crate::config::Config;
use crate::queue::AdmissionQueue;
use crate::recovery;
use crate::store::{EventStore, SqliteEventStore};
use crate::sweeper;
use crate::worker::{self, ProcessingAction, SimulatedDelayAction};

/// Shared, `Arc`-wrapped handles every HTTP handler and background task
/// needs. Cloning `AppState` is cheap; it only clones the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub queue: Arc<AdmissionQueue>,
    ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Owns every background task spawned at startup and the shutdown signal
/// that stops them.
pub struct Application {
    pub state: AppState,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Application {
    /// Startup order: open store (migrate, WAL, busy-timeout) → construct
    /// queue → run recovery loader → start workers → start sweeper → set
    /// ready. Matches the ordering the lifecycle contract requires:
    /// recovery must finish before the readiness flag flips.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let pool = open_store(&config.db_path).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::new(pool));

        let queue = Arc::new(AdmissionQueue::new(config.queue_maxsize));
        let loaded = recovery::load_pending(&queue, &store).await?;
        tracing::info!(loaded, "recovery loader re-enqueued non-terminal events");

        let config = Arc::new(config);
        let action: Arc<dyn ProcessingAction> = Arc::new(SimulatedDelayAction);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = Vec::new();
        for _ in 0..config.worker_count {
            let queue = queue.clone();
            let store = store.clone();
            let action = action.clone();
            let config = config.clone();
            let shutdown_rx = shutdown_rx.clone();
            tasks.push(tokio::spawn(worker::worker_loop(
                queue, store, action, config, shutdown_rx,
            )));
        }
        tasks.push(tokio::spawn(sweeper::run(
            store.clone(),
            config.clone(),
            shutdown_rx.clone(),
        )));

        let ready = Arc::new(AtomicBool::new(true));
        crate::metrics::init();

        Ok(Self {
            state: AppState { store, queue, ready },
            shutdown_tx,
            tasks,
        })
    }

    /// Cancels worker loops and the sweeper at their suspension points and
    /// waits for every in-flight commit to finish before returning.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn open_store(db_path: &str) -> anyhow::Result<sqlx::SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}
