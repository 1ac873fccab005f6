pub mod comments;
pub mod error;
pub mod favourites;
pub mod migrations;
pub mod models;
pub mod users;

pub use comments::CommentStore;
pub use error::{ErrorKind, Result, StoreError};
pub use favourites::{FavouriteStore, Scope};
pub use users::UserStore;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_READERS: usize = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared connection pool: one writer plus a round-robin set of readers.
///
/// Cloning is cheap; every store holds its own clone. Connections are only
/// reachable through `with_conn`/`with_conn_mut`, so a borrowed connection is
/// always released when the closure returns or fails.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Pool {
    /// Open a file-backed database with `readers` read-only connections.
    pub fn open(path: &Path, readers: usize) -> Result<Self> {
        let writer = Connection::open(path)?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        configure_writer(&writer)?;
        migrations::run(&writer)?;

        let readers = (0..readers.max(1))
            .map(|_| -> Result<Mutex<Connection>> {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            readers.len()
        );
        Ok(Self::from_parts(writer, readers))
    }

    /// Private in-memory database, used by tests. Every pooled connection
    /// attaches to the same named shared-cache database, which lives as long
    /// as the pool does.
    pub fn open_in_memory() -> Result<Self> {
        let uri = format!("file:flickhub-{}?mode=memory&cache=shared", Uuid::new_v4());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let writer = Connection::open_with_flags(&uri, flags)?;
        configure_writer(&writer)?;
        migrations::run(&writer)?;

        let reader = Connection::open_with_flags(&uri, flags)?;
        reader.pragma_update(None, "query_only", true)?;
        reader.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self::from_parts(writer, vec![Mutex::new(reader)]))
    }

    fn from_parts(writer: Connection, readers: Vec<Mutex<Connection>>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                writer: Mutex::new(writer),
                readers,
                reader_idx: AtomicUsize::new(0),
            }),
        }
    }

    /// Run a read-only query on the next reader connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let readers = &self.inner.readers;
        let idx = self.inner.reader_idx.fetch_add(1, Ordering::Relaxed) % readers.len();
        let conn = readers[idx]
            .lock()
            .map_err(|e| StoreError::Pool(format!("reader lock poisoned: {}", e)))?;
        log_failure(f(&conn))
    }

    /// Run statements on the writer connection. Writes are serialized here.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .inner
            .writer
            .lock()
            .map_err(|e| StoreError::Pool(format!("writer lock poisoned: {}", e)))?;
        log_failure(f(&mut conn))
    }
}

fn configure_writer(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn log_failure<T>(result: Result<T>) -> Result<T> {
    if let Err(StoreError::Database(e)) = &result {
        error!("Database error: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_readers_see_writer_commits() {
        let pool = Pool::open_in_memory().unwrap();

        pool.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (uname, pw, email) VALUES ('a', 'x', 'a@example.com')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count: i64 = pool
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn in_memory_pools_are_isolated() {
        let first = Pool::open_in_memory().unwrap();
        let second = Pool::open_in_memory().unwrap();

        first
            .with_conn_mut(|conn| {
                conn.execute(
                    "INSERT INTO users (uname, pw, email) VALUES ('a', 'x', 'a@example.com')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let count: i64 = second
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn in_memory_reader_waits_on_busy() {
        let pool = Pool::open_in_memory().unwrap();
        let timeout_ms: i64 = pool
            .with_conn(|conn| Ok(conn.query_row("PRAGMA busy_timeout", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(timeout_ms, BUSY_TIMEOUT.as_millis() as i64);
    }

    #[test]
    fn readers_refuse_writes() {
        let pool = Pool::open_in_memory().unwrap();
        let result = pool.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (uname, pw, email) VALUES ('a', 'x', 'a@example.com')",
                [],
            )?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Database(_))));
    }
}
