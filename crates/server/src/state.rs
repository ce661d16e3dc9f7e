//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::engine::TransitionEngine;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    engine: TransitionEngine,
}

impl AppState {
    /// Build the state from loaded configuration and a connected pool.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let engine = TransitionEngine::new(pool.clone(), config.lock_timeout);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                engine,
            }),
        }
    }

    /// The loaded server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// The database connection pool, for read-side queries.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The transition engine, the only write path to the stock ledger.
    #[must_use]
    pub fn engine(&self) -> &TransitionEngine {
        &self.inner.engine
    }
}
