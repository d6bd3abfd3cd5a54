use std::collections::HashMap;
use std::sync::Arc;

use crate::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::{CounterStore, PartitionKey, Result, StoreError};

#[cfg(feature = "cache-padded")]
type Cell = crossbeam_utils::CachePadded<Mutex<Option<u64>>>;
#[cfg(not(feature = "cache-padded"))]
type Cell = Mutex<Option<u64>>;

type PartitionMap = HashMap<PartitionKey, Arc<Cell>>;

fn new_cell() -> Arc<Cell> {
    #[cfg(feature = "cache-padded")]
    {
        Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(None)))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        Arc::new(Mutex::new(None))
    }
}

fn lock_cell(cell: &Cell) -> Result<MutexGuard<'_, Option<u64>>, StoreError> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(cell.lock())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        cell.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn read_map(map: &RwLock<PartitionMap>) -> Result<RwLockReadGuard<'_, PartitionMap>, StoreError> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(map.read())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        map.read().map_err(|_| StoreError::LockPoisoned)
    }
}

fn write_map(map: &RwLock<PartitionMap>) -> Result<RwLockWriteGuard<'_, PartitionMap>, StoreError> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(map.write())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        map.write().map_err(|_| StoreError::LockPoisoned)
    }
}

/// An in-process [`CounterStore`] keeping one lock per partition.
///
/// Each partition's counter lives in its own mutex cell, so allocation on
/// one partition never blocks allocation on another; the shared map is only
/// locked long enough to find (or lazily insert) a cell. Clones share the
/// same state, which makes the store cheap to hand to several allocators.
///
/// Counters here die with the process. Use this store for tests, for
/// single-process tools, or as the reference against which a durable store
/// is validated; anything that must survive a restart or span multiple
/// processes needs a shared durable store instead.
///
/// ## Recommended When
/// - You need allocator semantics without provisioning storage
/// - The sequence may reset on process restart
///
/// ## See Also
/// - `SqliteCounterStore` in the `sequor-sqlite` crate for durable counters
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    partitions: Arc<RwLock<PartitionMap>>,
}

impl MemoryCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn existing_cell(&self, key: &PartitionKey) -> Result<Option<Arc<Cell>>, StoreError> {
        let map = read_map(&self.partitions)?;
        Ok(map.get(key).cloned())
    }

    fn cell_or_insert(&self, key: &PartitionKey) -> Result<Arc<Cell>, StoreError> {
        if let Some(cell) = self.existing_cell(key)? {
            return Ok(cell);
        }
        let mut map = write_map(&self.partitions)?;
        Ok(Arc::clone(map.entry(key.clone()).or_insert_with(new_cell)))
    }
}

impl CounterStore for MemoryCounterStore {
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        let cell = self.cell_or_insert(key)?;
        let mut slot = lock_cell(&cell)?;
        let (next, out) = apply(*slot);
        debug_assert!(slot.is_none_or(|current| next >= current));
        *slot = Some(next);
        Ok(out)
    }

    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        match self.existing_cell(key)? {
            Some(cell) => Ok(*lock_cell(&cell)?),
            None => Ok(None),
        }
    }
}
