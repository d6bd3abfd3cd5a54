use crate::StoreError;

/// A result type whose error defaults to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error kinds an allocation can surface to its caller.
///
/// The two variants belong to different failure domains and should stay
/// distinguishable in any message shown to an end user: an invalid key means
/// the request itself was unusable, while [`Error::StorageUnavailable`] means
/// the request was fine but no identifier could be issued right now and the
/// enclosing business operation must be aborted, not persisted without one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller supplied an unusable partition key.
    ///
    /// Surfaced from [`PartitionKey`] construction, before any storage
    /// access is attempted.
    ///
    /// [`PartitionKey`]: crate::PartitionKey
    #[error("invalid partition key: {reason}")]
    InvalidPartitionKey {
        /// What made the key unusable.
        reason: &'static str,
    },

    /// The counter store failed and bounded retries were exhausted.
    ///
    /// For terminal store failures (e.g. [`StoreError::Corrupt`]) no retry
    /// is attempted and `attempts` is `1`. Either way, no serial was issued:
    /// the increment is fully committed and returned, or not committed at
    /// all.
    #[error("counter store unavailable after {attempts} attempt(s)")]
    StorageUnavailable {
        /// Allocation attempts made before giving up.
        attempts: u32,
        /// The classified store failure from the final attempt.
        #[source]
        source: StoreError,
    },
}
