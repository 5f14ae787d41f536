//! SQLite database setup and transaction entry points.
//!
//! The [`Database`] struct wraps a `rusqlite::Connection` behind an
//! `Arc<Mutex<>>` and exposes async methods that use
//! `tokio::task::spawn_blocking` so storage work never blocks the async
//! runtime. Read closures go through [`Database::execute`]; anything that
//! needs an explicit transaction goes through [`Database::execute_mut`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migration;

/// Thread-safe handle to the record store.
///
/// Holding a `Database` means the store opened successfully; there is no
/// separate "initialized" state to check before calling into it.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database at `path` and apply the connection
    /// pragmas.
    ///
    /// This call blocks briefly on file I/O, so run it during startup or
    /// wrap it in `spawn_blocking` yourself.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening record store");

        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database — useful for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory record store");

        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the store and bring its schema up to date.
    ///
    /// An engine-level failure here leaves the caller with no handle at
    /// all: there is no usable-but-unmigrated state to recover from.
    pub async fn open_and_migrate(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || Self::open(&path)).await??;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending schema migrations.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            migration::run_all(&conn)
        })
        .await?
    }

    /// Execute a read closure against the connection on the blocking pool.
    ///
    /// The closure receives a `&Connection` and must return a
    /// `StoreResult<T>`. Whatever it returns or raises propagates to the
    /// caller unchanged.
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            f(&conn)
        })
        .await?
    }

    /// Execute a mutable closure on the blocking pool.
    ///
    /// The closure receives a `&mut Connection` so it can open a
    /// `rusqlite` transaction; everything it writes commits or rolls back
    /// as one unit.
    pub async fn execute_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await?
    }

    // ── pragmas ──────────────────────────────────────────────────────

    fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
        // WAL keeps readers unblocked while a write transaction commits.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // NORMAL sync with WAL: a power failure can lose the last commit,
        // never corrupt the file.
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Concurrent writers wait out a busy store instead of failing
        // immediately.
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

        debug!("store pragmas applied (WAL, NORMAL sync)");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
