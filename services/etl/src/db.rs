//! Process-scoped store connection.
//!
//! A failed connection is not fatal: the handle stays empty and every
//! operation routed through it becomes a logged no-op.

use crate::error::{EtlError, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{error, info};

pub struct Store {
    pool: Option<SqlitePool>,
}

/// Open the single connection used for the lifetime of the process
pub async fn open_pool(db_url: &str) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(db_url)
        .await
        .map_err(|e| EtlError::ConnectionFailure(e.to_string()))
}

impl Store {
    pub async fn connect(db_url: &str) -> Self {
        match open_pool(db_url).await {
            Ok(pool) => {
                info!("Connected to database.");
                Self { pool: Some(pool) }
            }
            Err(e) => {
                error!(error = %e, "Database connection failed");
                Self { pool: None }
            }
        }
    }

    pub fn disconnected() -> Self {
        Self { pool: None }
    }

    /// The live pool, or `None` (logged) when the connection never came up
    pub fn pool(&self) -> Option<&SqlitePool> {
        if self.pool.is_none() {
            error!("No DB connection.");
        }
        self.pool.as_ref()
    }

    pub async fn disconnect(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
            info!("Disconnected from database.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let store = Store::connect("sqlite::memory:").await;
        assert!(store.pool().is_some());
        store.disconnect().await;
    }

    #[tokio::test]
    async fn test_connection_failure_leaves_store_empty() {
        let store = Store::connect("sqlite:///nonexistent-dir/covid.db?mode=ro").await;
        assert!(store.pool().is_none());
        // Disconnecting an empty handle is a no-op
        store.disconnect().await;
    }

    #[tokio::test]
    async fn test_open_pool_reports_connection_failure() {
        let result = open_pool("not-a-database-url").await;
        assert!(matches!(result, Err(EtlError::ConnectionFailure(_))));
    }
}
