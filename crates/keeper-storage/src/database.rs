// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and schema bootstrap.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.
//!
//! Query code goes through [`Database::run`], which ties each unit of work to
//! the future awaiting it. Dropping that future (a deadline elapsing, a client
//! going away) skips the work if it is still queued, or interrupts it and
//! rolls it back if it is running. A call that reports failure never commits
//! afterwards.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use keeper_core::KeeperError;
use rusqlite::{ErrorCode, InterruptHandle, ffi};
use tracing::debug;

use crate::migrations;

/// Upper bound on how long one call keeps retrying a locked database.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite's own busy wait per attempt. SQLite's busy handler ignores
/// `sqlite3_interrupt`, so longer waits are retried by [`Database::run`],
/// which checks for cancellation between attempts.
const BUSY_SLICE: Duration = Duration::from_millis(25);

/// Pause between attempts on a locked database.
const BUSY_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to the vault database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    interrupt: Arc<InterruptHandle>,
    busy_timeout: Duration,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs, and
    /// run pending migrations. The whole sequence must finish within
    /// `connect_timeout`.
    pub async fn open(
        path: &str,
        connect_timeout: Duration,
        wal_mode: bool,
    ) -> Result<Self, KeeperError> {
        match tokio::time::timeout(connect_timeout, Self::open_inner(path, wal_mode)).await {
            Ok(result) => result,
            Err(_) => Err(KeeperError::Timeout {
                duration: connect_timeout,
            }),
        }
    }

    /// Open a private in-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, KeeperError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(storage_err)?;
        Self::prepare(conn, false).await
    }

    /// Cap the time a call spends retrying a locked database. Values above
    /// [`BUSY_TIMEOUT`] are clamped.
    pub fn with_busy_timeout(mut self, limit: Duration) -> Self {
        self.busy_timeout = limit.min(BUSY_TIMEOUT);
        self
    }

    /// Current lock-retry budget.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    async fn open_inner(path: &str, wal_mode: bool) -> Result<Self, KeeperError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| KeeperError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path.to_string())
            .await
            .map_err(storage_err)?;
        let db = Self::prepare(conn, wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    async fn prepare(
        conn: tokio_rusqlite::Connection,
        wal_mode: bool,
    ) -> Result<Self, KeeperError> {
        let interrupt = conn
            .call(move |conn| -> Result<InterruptHandle, KeeperError> {
                apply_pragmas(conn, wal_mode).map_err(storage_err)?;
                migrations::run_migrations(conn)?;
                // Migrations may wait the full busy timeout; queries wait in
                // short slices so cancellation is noticed.
                conn.busy_timeout(BUSY_SLICE).map_err(storage_err)?;
                Ok(conn.get_interrupt_handle())
            })
            .await
            .map_err(flatten_err)?;
        Ok(Self {
            conn,
            interrupt: Arc::new(interrupt),
            busy_timeout: BUSY_TIMEOUT,
        })
    }

    /// The underlying async connection, for maintenance statements that run
    /// outside [`Database::run`].
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `op` inside its own transaction on the connection thread.
    ///
    /// The transaction commits only while the returned future is still being
    /// awaited. A locked database is retried until the busy timeout, which is
    /// then reported as [`KeeperError::Timeout`], as is an interrupted
    /// statement. Any other SQLite error goes through `map_err`.
    pub async fn run<T, F, M>(&self, mut op: F, map_err: M) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnMut(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        M: FnOnce(rusqlite::Error) -> KeeperError,
    {
        let guard = CallGuard {
            state: Arc::new(CallState::default()),
            interrupt: Arc::clone(&self.interrupt),
        };
        let state = Arc::clone(&guard.state);
        let busy_timeout = self.busy_timeout;

        let outcome = self
            .conn
            .call(move |conn| run_attempts(conn, &state, busy_timeout, &mut op))
            .await;
        drop(guard);

        match outcome {
            Ok(value) => Ok(value),
            Err(tokio_rusqlite::Error::Error(Failure::Cancelled)) => Err(KeeperError::Timeout {
                duration: busy_timeout,
            }),
            Err(tokio_rusqlite::Error::Error(Failure::Sqlite(e)))
                if is_busy(&e) || is_interrupted(&e) =>
            {
                Err(KeeperError::Timeout {
                    duration: busy_timeout,
                })
            }
            Err(tokio_rusqlite::Error::Error(Failure::Sqlite(e))) => Err(map_err(e)),
            Err(_) => Err(KeeperError::Storage {
                source: "database connection closed".into(),
            }),
        }
    }
}

/// Where a [`Database::run`] call is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Queued,
    Running,
    Finished,
    Cancelled,
}

/// Shared between the awaiting future and the connection thread. Commit and
/// cancellation both happen under this lock.
#[derive(Default)]
struct CallState {
    phase: Mutex<Phase>,
}

impl CallState {
    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `Running`; false if the caller already gave up.
    fn start(&self) -> bool {
        let mut phase = self.lock();
        if *phase == Phase::Cancelled {
            return false;
        }
        *phase = Phase::Running;
        true
    }

    fn is_cancelled(&self) -> bool {
        *self.lock() == Phase::Cancelled
    }

    fn finish(&self) {
        let mut phase = self.lock();
        if *phase == Phase::Running {
            *phase = Phase::Finished;
        }
    }
}

/// Cancels its call when dropped before the call finished.
struct CallGuard {
    state: Arc<CallState>,
    interrupt: Arc<InterruptHandle>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let mut phase = self.state.lock();
        match *phase {
            Phase::Queued => *phase = Phase::Cancelled,
            Phase::Running => {
                // Holding the lock keeps the connection on this call, so the
                // interrupt cannot reach a later one.
                self.interrupt.interrupt();
                *phase = Phase::Cancelled;
            }
            Phase::Finished | Phase::Cancelled => {}
        }
    }
}

enum Failure {
    Cancelled,
    Sqlite(rusqlite::Error),
}

fn run_attempts<T, F>(
    conn: &mut rusqlite::Connection,
    state: &CallState,
    busy_timeout: Duration,
    op: &mut F,
) -> Result<T, Failure>
where
    F: FnMut(&rusqlite::Connection) -> rusqlite::Result<T>,
{
    if !state.start() {
        debug!("storage call dropped before it started");
        return Err(Failure::Cancelled);
    }

    let started = Instant::now();
    let result = loop {
        match attempt(conn, state, op) {
            Err(Failure::Sqlite(e)) if is_busy(&e) && started.elapsed() < busy_timeout => {
                std::thread::sleep(BUSY_RETRY_INTERVAL);
                if state.is_cancelled() {
                    break Err(Failure::Cancelled);
                }
            }
            other => break other,
        }
    };
    state.finish();
    result
}

fn attempt<T, F>(
    conn: &mut rusqlite::Connection,
    state: &CallState,
    op: &mut F,
) -> Result<T, Failure>
where
    F: FnMut(&rusqlite::Connection) -> rusqlite::Result<T>,
{
    let tx = conn.transaction().map_err(Failure::Sqlite)?;
    let value = op(&tx).map_err(Failure::Sqlite)?;

    let phase = state.lock();
    if *phase == Phase::Cancelled {
        debug!("storage call cancelled, rolling back");
        return Err(Failure::Cancelled);
    }
    tx.commit().map_err(Failure::Sqlite)?;
    drop(phase);
    Ok(value)
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn is_interrupted(e: &rusqlite::Error) -> bool {
    e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        // journal_mode answers with the resulting mode, so it needs the
        // checked variant.
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get(0)
        })?;
        debug!(mode = %mode, "journal mode set");
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// Wrap a SQLite failure as [`KeeperError::Storage`].
pub(crate) fn storage_err<E>(e: E) -> KeeperError
where
    E: std::error::Error + Send + Sync + 'static,
{
    KeeperError::Storage {
        source: Box::new(e),
    }
}

/// Unwrap a closure that already produced a [`KeeperError`].
pub(crate) fn flatten_err(e: tokio_rusqlite::Error<KeeperError>) -> KeeperError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => KeeperError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Constraint class of a failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

/// Classify a failed statement by SQLite's extended result code.
pub(crate) fn constraint_violation(e: &rusqlite::Error) -> Option<Constraint> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => match err.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                Some(Constraint::Unique)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
            _ => None,
        },
        _ => None,
    }
}
