use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::{ExpiredDeletion, MemoryStore as MemorySessionStore};

use crate::{
    config::{AppConfig, StoreBackend},
    evaluate::Evaluator,
    store::{MemoryStore, PgSessionStore, PgStore, Store},
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Where session records live; follows the record store backend.
#[derive(Clone, Debug)]
pub enum SessionBackend {
    Postgres(PgSessionStore),
    Memory(MemorySessionStore),
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub sessions: SessionBackend,
    pub evaluator: Arc<Evaluator>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let (store, sessions): (Arc<dyn Store>, SessionBackend) = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }

                let sessions = PgSessionStore::new(db.clone());
                spawn_session_sweeper(sessions.clone());
                (
                    Arc::new(PgStore::new(db)),
                    SessionBackend::Postgres(sessions),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                (
                    Arc::new(MemoryStore::new()),
                    SessionBackend::Memory(MemorySessionStore::default()),
                )
            }
        };

        Self::from_parts(store, sessions, Arc::new(config))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        sessions: SessionBackend,
        config: Arc<AppConfig>,
    ) -> anyhow::Result<Self> {
        let evaluator = Arc::new(Evaluator::new(config.evaluator.clone())?);
        if !evaluator.is_configured() {
            tracing::warn!("SCORING_API_KEY is not set; essay evaluation will fail");
        }
        Ok(Self {
            store,
            config,
            sessions,
            evaluator,
        })
    }
}

fn spawn_session_sweeper(store: PgSessionStore) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            if let Err(e) = store.delete_expired().await {
                tracing::warn!(error = %e, "expired session sweep failed");
            }
        }
    });
}
