mod allocator;
mod sleep_provider;

pub use allocator::*;
pub use sleep_provider::*;
