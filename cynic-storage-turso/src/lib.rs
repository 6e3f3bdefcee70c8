#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

//! # CYNIC Turso Store
//!
//! libSQL/Turso implementation of the kernel's [`Store`] trait: durable
//! judgments, hash-linked blocks, pattern evolution rows, facts, profiles,
//! feedback queues, learning-cycle audit records and e-score history.
//!
//! A local file database is the default deployment; a remote Turso URL with
//! an auth token works identically. Transient failures are retried with
//! 50/150/450 ms backoff.

mod blocks;
mod escore;
mod facts;
mod feedback;
mod judgments;
mod maintenance;
mod patterns;
mod profiles;
mod retry;
mod rows;
pub mod schema;
mod sessions;
mod store_impl;

use std::sync::Arc;

use libsql::Builder;
use tracing::{debug, info};

use cynic_core::{Error, Result};

pub use retry::with_retry;

/// libSQL-backed durable store
pub struct TursoStore {
    db: Arc<libsql::Database>,
}

impl TursoStore {
    /// Connect to a database URL.
    ///
    /// `libsql://` URLs are remote and require a non-empty token; `file:`
    /// paths and `:memory:` are local and need none.
    pub async fn connect(url: &str, token: &str) -> Result<Self> {
        info!(url, "connecting to store");

        if !url.starts_with("libsql://") && !url.starts_with("file:") && url != ":memory:" {
            return Err(Error::Validation(format!(
                "unsupported database URL: {url}; expected libsql://, file:, or :memory:"
            )));
        }
        if url.starts_with("libsql://") && token.trim().is_empty() {
            return Err(Error::Validation(
                "auth token required for remote store connections".to_string(),
            ));
        }

        let db = if url.starts_with("libsql://") {
            Builder::new_remote(url.to_string(), token.to_string())
                .build()
                .await
                .map_err(|e| Error::Storage(format!("failed to connect: {e}")))?
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            Builder::new_local(path)
                .build()
                .await
                .map_err(|e| Error::Storage(format!("failed to open {path}: {e}")))?
        };

        let store = Self { db: Arc::new(db) };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open a local database file
    pub async fn open_local(path: &std::path::Path) -> Result<Self> {
        Self::connect(&format!("file:{}", path.display()), "").await
    }

    pub(crate) fn get_connection(&self) -> Result<libsql::Connection> {
        self.db
            .connect()
            .map_err(|e| Error::Storage(format!("failed to get connection: {e}")))
    }

    /// Create every table and index, idempotently
    async fn init_schema(&self) -> Result<()> {
        let conn = self.get_connection()?;
        for statement in schema::ALL_SCHEMA {
            conn.execute(statement, ())
                .await
                .map_err(|e| Error::Storage(format!("schema init failed: {e}")))?;
        }
        debug!("schema initialized");
        Ok(())
    }

    /// Run statements inside one transaction, rolling back on any error
    pub(crate) async fn in_transaction<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(libsql::Connection) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let conn = self.get_connection()?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| Error::Storage(format!("begin failed: {e}")))?;
        match f(conn.clone()).await {
            Ok(value) => {
                conn.execute("COMMIT", ())
                    .await
                    .map_err(|e| Error::Storage(format!("commit failed: {e}")))?;
                Ok(value)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }
}
