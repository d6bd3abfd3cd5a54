use crate::{CounterStore, PartitionKey, Result, StoreError};

/// The rule for what value a brand-new partition's counter starts from.
///
/// A policy is consulted once per partition, for its first allocation; the
/// first serial issued is `seed + 1`. Every partition a policy reads from
/// must already be immutable when the new partition opens (e.g. a closed
/// day), so concurrent first allocations compute the same seed and the
/// store's atomic update decides which of them creates the row.
pub trait SeedPolicy {
    /// Returns the starting value for `key`'s counter.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a probe of the store fails.
    fn seed<S: CounterStore>(&self, key: &PartitionKey, store: &S) -> Result<u64, StoreError>;
}

/// Fresh partitions start at zero; their first serial is `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroSeed;

impl SeedPolicy for ZeroSeed {
    fn seed<S: CounterStore>(&self, _key: &PartitionKey, _store: &S) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Seeds a fresh partition from the committed value of a related prior
/// partition, so a sequence continues across a partition rollover instead of
/// restarting.
///
/// `prior` maps the fresh key to candidate predecessor keys, probed in
/// order; the first committed value wins. With no committed predecessor the
/// counter starts at zero. Returning a chain of candidates (rather than a
/// single predecessor) lets a calendar-keyed sequence skip over days that
/// recorded nothing.
///
/// # Example
/// ```
/// use sequor::{CarryForward, CounterAllocator, MemoryCounterStore, PartitionKey};
///
/// let store = MemoryCounterStore::new();
/// let epochs = CounterAllocator::new(&store);
/// let epoch_one = PartitionKey::new("epoch-1")?;
/// for _ in 0..42 {
///     epochs.try_allocate(&epoch_one)?;
/// }
///
/// // A new epoch's numbering continues where the previous one stopped.
/// let continued = CounterAllocator::with_seed(
///     &store,
///     CarryForward::new(|_key: &PartitionKey| PartitionKey::new("epoch-1").ok()),
/// );
/// let serial = continued.try_allocate(&PartitionKey::new("epoch-2")?)?;
/// assert_eq!(serial.get(), 43);
/// # Ok::<(), sequor::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CarryForward<F> {
    prior: F,
}

impl<F> CarryForward<F> {
    /// Creates a policy probing the keys `prior` yields, in order.
    pub const fn new(prior: F) -> Self {
        Self { prior }
    }
}

impl<F, I> SeedPolicy for CarryForward<F>
where
    F: Fn(&PartitionKey) -> I,
    I: IntoIterator<Item = PartitionKey>,
{
    fn seed<S: CounterStore>(&self, key: &PartitionKey, store: &S) -> Result<u64, StoreError> {
        for candidate in (self.prior)(key) {
            if let Some(value) = store.peek(&candidate)? {
                return Ok(value);
            }
        }
        Ok(0)
    }
}
