use crate::{PartitionKey, Result, Serial};

/// A partition-scoped sequence allocator.
///
/// For a fixed partition key, serials are unique, dense and strictly
/// increasing across all callers for the lifetime of the backing store: if
/// one call returns before another begins, the first serial is strictly
/// smaller; overlapping calls receive distinct serials ordered by commit.
/// No ordering holds across different partitions, and allocation on one
/// partition must not serialize against allocation on another.
///
/// Callers build human-readable identifiers from the returned serial (see
/// [`IdentifierFormat`]) and must not persist the owning record when
/// allocation fails: a failed allocation issued nothing.
///
/// [`IdentifierFormat`]: crate::IdentifierFormat
pub trait SequenceAllocator {
    /// Allocates the next serial for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] when the counter store fails
    /// after bounded retries.
    ///
    /// [`Error::StorageUnavailable`]: crate::Error::StorageUnavailable
    fn try_allocate(&self, key: &PartitionKey) -> Result<Serial>;

    /// Returns the last committed serial for `key` without taking the write
    /// claim, or `None` for a partition that has never allocated.
    ///
    /// This is the display-path accessor: it never blocks behind or starves
    /// writers the way a second allocation would.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] when the counter store cannot
    /// be read.
    ///
    /// [`Error::StorageUnavailable`]: crate::Error::StorageUnavailable
    fn try_last_issued(&self, key: &PartitionKey) -> Result<Option<Serial>>;
}
