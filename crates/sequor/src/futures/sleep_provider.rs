use core::time::Duration;

/// A trait that abstracts over how to sleep for a given [`Duration`] in
/// async contexts.
///
/// This lets the allocator's retry backoff be expressed as a suspension
/// point on any runtime (e.g. `Tokio` or `Smol`) instead of blocking the
/// calling task.
pub trait SleepProvider {
    /// We require `Send + 'static` so that a future awaiting the sleep can
    /// be safely moved across threads and spawned onto a runtime.
    type Sleep: Future<Output = ()> + Send + 'static;

    /// Returns a future that completes after `dur`.
    fn sleep_for(dur: Duration) -> Self::Sleep;
}
