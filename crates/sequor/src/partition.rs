use core::fmt;

use crate::{Error, Result};

/// Separator between the segments of a composite key.
pub(crate) const SEGMENT_SEPARATOR: char = '|';

/// The scope within which serials are unique, dense and strictly increasing.
///
/// A key is an opaque, exact-match string: `"2025"` and `"2025 "` name two
/// different partitions, and no case folding or trimming is performed here.
/// Whatever normalization the naming scheme needs must happen before the key
/// is constructed.
///
/// Composite scopes (e.g. a section plus a year) are built with
/// [`PartitionKey::composite`], which joins its segments with `|`.
///
/// # Example
/// ```
/// use sequor::PartitionKey;
///
/// let year = PartitionKey::new("2025")?;
/// let section_year = PartitionKey::composite(["RTI", "2025"])?;
/// assert_eq!(section_year.as_str(), "RTI|2025");
/// # Ok::<(), sequor::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Wraps `key` as a partition key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartitionKey`] if `key` is empty. Nothing else
    /// is rejected: the key is opaque to the allocator.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidPartitionKey { reason: "empty key" });
        }
        Ok(Self(key))
    }

    /// Builds a composite key by joining `segments` with `|`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartitionKey`] if there are no segments or any
    /// segment is empty.
    pub fn composite<I>(segments: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut joined = String::new();
        let mut count = 0usize;
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                return Err(Error::InvalidPartitionKey {
                    reason: "empty composite segment",
                });
            }
            if count > 0 {
                joined.push(SEGMENT_SEPARATOR);
            }
            joined.push_str(segment);
            count += 1;
        }
        if count == 0 {
            return Err(Error::InvalidPartitionKey {
                reason: "no composite segments",
            });
        }
        Ok(Self(joined))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
