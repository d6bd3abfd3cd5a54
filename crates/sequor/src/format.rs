use crate::Serial;

/// Renders a human-readable identifier from scope segments and an allocated
/// serial, e.g. `2025/0007` or `RTI-2025-0004`.
///
/// Rendering is deterministic sugar: the identifier is unique exactly when
/// the `(partition, serial)` pair behind it is, so callers should derive the
/// segments from the same values the partition key was built from.
///
/// # Example
/// ```
/// use sequor::{IdentifierFormat, SECTION_DASH_FORMAT, Serial};
///
/// assert_eq!(SECTION_DASH_FORMAT.render(&["RTI", "2025"], Serial::new(4)), "RTI-2025-0004");
///
/// let custom = IdentifierFormat::new('.', 3);
/// assert_eq!(custom.render(&["A"], Serial::new(12)), "A.012");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierFormat {
    separator: char,
    width: usize,
}

impl IdentifierFormat {
    /// Creates a format joining segments and the zero-padded serial with
    /// `separator`.
    pub const fn new(separator: char, width: usize) -> Self {
        Self { separator, width }
    }

    /// Renders `segments` followed by `serial` padded to the format's width.
    pub fn render(&self, segments: &[&str], serial: Serial) -> String {
        let mut rendered = String::new();
        for segment in segments {
            rendered.push_str(segment);
            rendered.push(self.separator);
        }
        rendered.push_str(&serial.padded(self.width));
        rendered
    }
}

/// `2025/0001` — year-scoped registers.
pub const YEAR_SLASH_FORMAT: IdentifierFormat = IdentifierFormat::new('/', 4);

/// `RTI-2025-0001` — section-plus-year-scoped registers.
pub const SECTION_DASH_FORMAT: IdentifierFormat = IdentifierFormat::new('-', 4);

/// `2025-000001` — year-prefixed registers with six-digit serials.
pub const WIDE_DASH_FORMAT: IdentifierFormat = IdentifierFormat::new('-', 6);
