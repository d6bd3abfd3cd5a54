use core::fmt;

/// A serial issued within one partition.
///
/// Serials are dense and strictly increasing per partition: a fresh
/// partition's first allocation yields `1` (or `seed + 1` under a seeded
/// policy), and every later allocation yields the previously committed value
/// plus one. Serials from different partitions are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Serial(u64);

impl Serial {
    /// Wraps a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Renders the serial zero-padded to at least `width` digits.
    ///
    /// Values that already have more digits keep all of them.
    ///
    /// # Example
    /// ```
    /// use sequor::Serial;
    ///
    /// assert_eq!(Serial::new(7).padded(4), "0007");
    /// assert_eq!(Serial::new(12345).padded(4), "12345");
    /// ```
    pub fn padded(self, width: usize) -> String {
        format!("{:0width$}", self.0)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Serial> for u64 {
    fn from(serial: Serial) -> Self {
        serial.0
    }
}
