use core::pin::Pin;
use core::time::Duration;

use crate::{
    CounterAllocator, CounterStore, PartitionKey, Result, SeedPolicy, Serial, SleepProvider,
};

/// Extension trait for allocating serials asynchronously on the
/// [`smol`](https://docs.rs/smol) async runtime.
///
/// This trait provides a convenience method for using a [`SleepProvider`]
/// backed by the `smol` runtime, so callers do not have to spell out the
/// sleep strategy.
pub trait SequenceAllocatorAsyncSmolExt {
    /// Returns a future that resolves to the next serial for `key`, using
    /// [`SmolSleep`] to wait out retry backoff.
    ///
    /// Internally delegates to
    /// [`SequenceAllocatorAsyncExt::try_allocate_async`] with [`SmolSleep`]
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

impl<S, P> SequenceAllocatorAsyncSmolExt for CounterAllocator<S, P>
where
    S: CounterStore + Sync,
    P: SeedPolicy + Sync,
{
    fn try_allocate_async(
        &self,
        key: &PartitionKey,
    ) -> impl Future<Output = Result<Serial>> + Send {
        <Self as crate::SequenceAllocatorAsyncExt>::try_allocate_async::<SmolSleep>(self, key)
    }
}

/// An implementation of [`SleepProvider`] using Smol's timer.
///
/// This is the default provider for use in async applications built on
/// Smol.
pub struct SmolSleep;
impl SleepProvider for SmolSleep {
    /// Smol's `Timer` resolves to an `Instant`, so we box a wrapper that
    /// discards it.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        Box::pin(async move {
            smol::Timer::after(dur).await;
        })
    }
}

/// An implementation of [`SleepProvider`] using Smol's yield.
///
/// This strategy avoids timer-based delays by yielding to the scheduler
/// immediately, which can improve responsiveness in low-concurrency
/// scenarios at the cost of tighter polling loops under load.
pub struct SmolYield;
impl SleepProvider for SmolYield {
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(_dur: Duration) -> Self::Sleep {
        Box::pin(smol::future::yield_now())
    }
}
