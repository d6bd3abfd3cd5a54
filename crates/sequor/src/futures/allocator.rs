use core::future::Future;

use super::SleepProvider;
use crate::{CounterAllocator, CounterStore, Error, PartitionKey, Result, SeedPolicy, Serial};

/// Extension trait for allocating serials asynchronously.
///
/// The returned future performs the same bounded-retry allocation as the
/// sync path, but waits out backoff delays through a [`SleepProvider`]
/// suspension instead of putting the thread to sleep. Cancelling the future
/// between attempts never leaves a partition half-incremented: each attempt
/// is one atomic store update that either committed or did not.
pub trait SequenceAllocatorAsyncExt {
    /// Returns a future that resolves to the next serial for `key`.
    ///
    /// Transient store failures are retried per the allocator's retry
    /// policy, suspending via `S` between attempts.
    ///
    /// # Errors
    ///
    /// Resolves to [`Error::StorageUnavailable`] once retries are
    /// exhausted, or immediately for non-transient failures.
    fn try_allocate_async<S>(
        &self,
        key: &PartitionKey,
    ) -> impl Future<Output = Result<Serial>> + Send
    where
        S: SleepProvider;
}

impl<S, P> SequenceAllocatorAsyncExt for CounterAllocator<S, P>
where
    S: CounterStore + Sync,
    P: SeedPolicy + Sync,
{
    fn try_allocate_async<Sl>(
        &self,
        key: &PartitionKey,
    ) -> impl Future<Output = Result<Serial>> + Send
    where
        Sl: SleepProvider,
    {
        async move {
            let retry = self.retry_policy();
            let mut attempts = 0u32;
            loop {
                attempts += 1;
                match self.try_allocate_once(key) {
                    Ok(serial) => return Ok(serial),
                    Err(source) if source.is_transient() && attempts < retry.max_attempts() => {
                        Sl::sleep_for(retry.delay_for(attempts)).await;
                    }
                    Err(source) => return Err(Error::StorageUnavailable { attempts, source }),
                }
            }
        }
    }
}
