use core::pin::Pin;
use core::time::Duration;

use crate::{
    CounterAllocator, CounterStore, PartitionKey, Result, SeedPolicy, Serial, SleepProvider,
};

/// Extension trait for allocating serials asynchronously on the
/// [`tokio`](https://docs.rs/tokio) async runtime.
///
/// This trait provides a convenience method for using a [`SleepProvider`]
/// backed by the `tokio` runtime, so callers do not have to spell out the
/// sleep strategy.
pub trait SequenceAllocatorAsyncTokioExt {
    /// Returns a future that resolves to the next serial for `key`, using
    /// [`TokioSleep`] to wait out retry backoff.
    ///
    /// Internally delegates to
    /// [`SequenceAllocatorAsyncExt::try_allocate_async`] with [`TokioSleep`]
    /// as the sleep strategy.
    ///
    /// # Errors
    ///
    /// Resolves to the same errors as
    /// [`SequenceAllocatorAsyncExt::try_allocate_async`].
    ///
    /// [`SequenceAllocatorAsyncExt::try_allocate_async`]:
    ///     crate::SequenceAllocatorAsyncExt::try_allocate_async
    fn try_allocate_async(
        &self,
        key: &PartitionKey,
    ) -> impl Future<Output = Result<Serial>> + Send;
}

impl<S, P> SequenceAllocatorAsyncTokioExt for CounterAllocator<S, P>
where
    S: CounterStore + Sync,
    P: SeedPolicy + Sync,
{
    fn try_allocate_async(
        &self,
        key: &PartitionKey,
    ) -> impl Future<Output = Result<Serial>> + Send {
        <Self as crate::SequenceAllocatorAsyncExt>::try_allocate_async::<TokioSleep>(self, key)
    }
}

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on
/// Tokio.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// This strategy avoids timer-based delays by yielding to the scheduler
/// immediately, which can improve responsiveness in low-concurrency
/// scenarios at the cost of tighter polling loops under load.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    /// Tokio's `yield_now()` returns a private future type, so we must use
    /// a boxed `dyn Future` to abstract over it.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(_dur: Duration) -> Self::Sleep {
        Box::pin(tokio::task::yield_now())
    }
}
