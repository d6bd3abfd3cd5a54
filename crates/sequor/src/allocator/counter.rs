use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    CounterStore, Error, PartitionKey, Result, RetryPolicy, SeedPolicy, SequenceAllocator, Serial,
    StoreError, ZeroSeed,
};

/// A [`SequenceAllocator`] backed by a [`CounterStore`].
///
/// Each allocation is one atomic read-increment-commit on the partition's
/// counter row, serialized by the store itself, so uniqueness holds even
/// when several processes share the store. Transient store failures are
/// retried with the configured [`RetryPolicy`] before surfacing
/// [`Error::StorageUnavailable`].
///
/// The allocator itself is stateless between calls; cloning it (or wrapping
/// one in an `Arc`) is purely a convenience and all clones remain mutually
/// consistent because the counter lives in the store.
///
/// # Example
/// ```
/// use sequor::{CounterAllocator, MemoryCounterStore, PartitionKey, YEAR_SLASH_FORMAT};
///
/// let allocator = CounterAllocator::new(MemoryCounterStore::new());
/// let year = PartitionKey::new("2025")?;
///
/// let serial = allocator.try_allocate(&year)?;
/// assert_eq!(YEAR_SLASH_FORMAT.render(&["2025"], serial), "2025/0001");
/// # Ok::<(), sequor::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CounterAllocator<S, P = ZeroSeed> {
    store: S,
    seed: P,
    retry: RetryPolicy,
}

impl<S> CounterAllocator<S>
where
    S: CounterStore,
{
    /// Creates an allocator whose partitions start at zero.
    pub fn new(store: S) -> Self {
        Self::with_seed(store, ZeroSeed)
    }
}

impl<S, P> CounterAllocator<S, P>
where
    S: CounterStore,
    P: SeedPolicy,
{
    /// Creates an allocator with an explicit [`SeedPolicy`].
    pub fn with_seed(store: S, seed: P) -> Self {
        Self {
            store,
            seed,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy applied to transient store failures.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The retry policy applied to transient store failures.
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// The backing counter store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Makes a single allocation attempt, with no retry.
    ///
    /// This is the primitive [`Self::try_allocate`] wraps: one atomic
    /// read-increment-commit on the partition's row. Callers that drive
    /// their own retry loop (e.g. the async extension, which must suspend
    /// rather than sleep) use this directly.
    ///
    /// # Errors
    ///
    /// Returns the classified [`StoreError`] of the failed attempt.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_allocate_once(&self, key: &PartitionKey) -> Result<Serial, StoreError> {
        // The seed only matters for a partition's first allocation, and the
        // partitions a policy probes are immutable by the time the new one
        // opens: racing first allocations compute the same seed, and the
        // store's atomic update decides which one creates the row.
        let seed = match self.store.peek(key)? {
            Some(_) => 0,
            None => self.seed.seed(key, &self.store)?,
        };
        self.store.update(key, |current| {
            let last = current.unwrap_or(seed);
            match last.checked_add(1) {
                Some(next) => (next, Ok(Serial::new(next))),
                None => (last, Err(StoreError::Corrupt(String::from("counter at u64::MAX")))),
            }
        })?
    }

    fn allocate_with_retry(
        &self,
        key: &PartitionKey,
        mut wait: impl FnMut(core::time::Duration),
    ) -> Result<Serial> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.try_allocate_once(key) {
                Ok(serial) => return Ok(serial),
                Err(source) if source.is_transient() && attempts < self.retry.max_attempts() => {
                    wait(self.retry.delay_for(attempts));
                }
                Err(source) => return Err(Error::StorageUnavailable { attempts, source }),
            }
        }
    }
}

impl<S, P> SequenceAllocator for CounterAllocator<S, P>
where
    S: CounterStore,
    P: SeedPolicy,
{
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    fn try_allocate(&self, key: &PartitionKey) -> Result<Serial> {
        self.allocate_with_retry(key, thread::sleep)
    }

    fn try_last_issued(&self, key: &PartitionKey) -> Result<Option<Serial>> {
        self.store
            .peek(key)
            .map(|value| value.map(Serial::new))
            .map_err(|source| Error::StorageUnavailable {
                attempts: 1,
                source,
            })
    }
}

impl<S, P> CounterAllocator<S, P>
where
    S: CounterStore,
    P: SeedPolicy,
{
    /// Allocates the next serial for `key`, retrying transient store
    /// failures per the configured [`RetryPolicy`].
    ///
    /// Inherent mirror of [`SequenceAllocator::try_allocate`] so callers do
    /// not need the trait in scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] once retries are exhausted (or
    /// immediately for non-transient failures). No serial was issued in
    /// that case.
    pub fn try_allocate(&self, key: &PartitionKey) -> Result<Serial> {
        <Self as SequenceAllocator>::try_allocate(self, key)
    }

    /// Returns the last committed serial for `key` without taking the write
    /// claim.
    ///
    /// Inherent mirror of [`SequenceAllocator::try_last_issued`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] when the store cannot be read.
    pub fn try_last_issued(&self, key: &PartitionKey) -> Result<Option<Serial>> {
        <Self as SequenceAllocator>::try_last_issued(self, key)
    }
}
