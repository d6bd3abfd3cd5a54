use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, TransactionBehavior, params};
use sequor::{CounterStore, PartitionKey, Result, StoreError};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// How long a connection waits on another writer before the engine reports
/// a busy error, which is surfaced as a retryable [`StoreError::Conflict`].
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// A durable [`CounterStore`] keeping one row per partition in SQLite.
///
/// Every update runs in an immediate transaction, so the
/// read-increment-commit on a counter row is serialized by the database
/// file itself and uniqueness holds across connections and processes
/// sharing it. The database uses WAL journaling so readers are not blocked
/// by a writer.
///
/// SQLite locks the whole database for a write, not single rows: updates on
/// different partitions briefly serialize at the engine even though the
/// allocator takes no cross-partition lock. A counter bump holds the write
/// lock for microseconds, so this matters only under extreme write rates;
/// lock waits past the busy timeout come back as [`StoreError::Conflict`]
/// and are retried by the allocator.
///
/// Clones share one connection. Independent processes (or tests simulating
/// them) should each [`open`] the same path instead.
///
/// ## Recommended When
/// - Serials must survive process restarts
/// - Several processes share one counter database
///
/// ## See Also
/// - `MemoryCounterStore` in `sequor` for process-local counters
///
/// [`open`]: SqliteCounterStore::open
#[derive(Clone)]
pub struct SqliteCounterStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCounterStore {
    /// Opens the counter database at `path`, creating file and schema as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(path, flags).map_err(map_store_err)?;
        Self::initialize(connection)
    }

    /// Opens a private in-memory database.
    ///
    /// Handy for tests: same engine semantics, no durability. Clones still
    /// share the one connection and therefore the one database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// opened or initialized.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(map_store_err)?;
        Self::initialize(connection)
    }

    fn initialize(connection: Connection) -> Result<Self, StoreError> {
        connection.busy_timeout(BUSY_TIMEOUT).map_err(map_store_err)?;
        connection
            .execute_batch(
                "PRAGMA journal_mode = wal;
                 PRAGMA synchronous = normal;
                 CREATE TABLE IF NOT EXISTS sequence_counters (
                     partition_key TEXT PRIMARY KEY,
                     last_value    INTEGER NOT NULL
                 );",
            )
            .map_err(map_store_err)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Unavailable(String::from("connection mutex poisoned")))
    }
}

impl CounterStore for SqliteCounterStore {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, apply)))]
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        let mut connection = self.lock_connection()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_store_err)?;

        let current: Option<i64> = tx
            .query_row(
                "SELECT last_value FROM sequence_counters WHERE partition_key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_store_err)?;
        let current = current.map(|value| decode_counter(key, value)).transpose()?;

        let (next, out) = apply(current);
        let next = i64::try_from(next).map_err(|_| {
            StoreError::Corrupt(format!("counter out of range for partition {key}"))
        })?;

        tx.execute(
            "INSERT INTO sequence_counters (partition_key, last_value) VALUES (?1, ?2)
             ON CONFLICT(partition_key) DO UPDATE SET last_value = excluded.last_value",
            params![key.as_str(), next],
        )
        .map_err(map_store_err)?;
        tx.commit().map_err(map_store_err)?;
        Ok(out)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        let connection = self.lock_connection()?;
        let value: Option<i64> = connection
            .query_row(
                "SELECT last_value FROM sequence_counters WHERE partition_key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_store_err)?;
        value.map(|value| decode_counter(key, value)).transpose()
    }
}

fn decode_counter(key: &PartitionKey, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("negative counter for partition {key}")))
}

fn map_store_err(error: rusqlite::Error) -> StoreError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => StoreError::Conflict,
        _ => StoreError::Unavailable(error.to_string()),
    }
}
