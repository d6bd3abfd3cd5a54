use crate::{PartitionKey, Result};

/// Failure kinds a [`CounterStore`] can report.
///
/// The split matters for retry behavior: [`StoreError::is_transient`] kinds
/// are retried with bounded backoff by the allocator, everything else
/// surfaces immediately. A store implementation should classify carefully
/// rather than funnel every failure into one retryable bucket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Another writer committed the partition's row first.
    ///
    /// The row is intact; a later attempt will observe the winner's value.
    #[error("write conflict on counter row")]
    Conflict,

    /// The store could not be reached, or a lock wait timed out.
    #[error("counter store unreachable: {0}")]
    Unavailable(String),

    /// The counter row held a value the store could not interpret.
    ///
    /// Never retried: the row needs operator attention.
    #[error("counter row unusable: {0}")]
    Corrupt(String),

    /// The in-process lock guarding counter state was poisoned.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, locks do not poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("counter lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether a retry may succeed without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict | Self::Unavailable(_))
    }
}

/// A durable keyed counter table: one row per partition, holding the last
/// committed serial.
///
/// This is the mutual-exclusion boundary for allocation. [`update`] must be
/// atomic per key and enforced by the shared store itself (a row lock, a
/// conditional write, or an equivalent), never by an in-process monitor
/// alone, so that uniqueness holds across multiple application processes
/// sharing the store. The claim is scoped to one key: updates on different
/// keys should not serialize against each other beyond what the underlying
/// engine requires.
///
/// Rows are created lazily by the first [`update`] on a key, updated in
/// place, and never deleted.
///
/// [`update`]: CounterStore::update
pub trait CounterStore {
    /// Atomically transforms the counter row for `key`.
    ///
    /// `apply` receives the committed value (`None` if the row does not
    /// exist yet) and returns the value to commit along with a result that
    /// is passed through to the caller. The partition's exclusive claim is
    /// held from the read through the commit; either the returned value is
    /// fully committed or, on error, the row is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a classified [`StoreError`] when the claim cannot be taken or
    /// the commit fails.
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError>;

    /// Reads the committed value for `key` without taking the write claim.
    ///
    /// Returns `None` for a partition that has never been allocated from.
    /// Intended for display paths, so it must not starve writers.
    ///
    /// # Errors
    ///
    /// Returns a classified [`StoreError`] when the store cannot be read.
    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError>;
}

impl<S: CounterStore> CounterStore for &S {
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        (**self).update(key, apply)
    }

    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        (**self).peek(key)
    }
}

impl<S: CounterStore> CounterStore for std::sync::Arc<S> {
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        (**self).update(key, apply)
    }

    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        (**self).peek(key)
    }
}
