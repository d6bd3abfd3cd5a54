mod counter;
mod interface;
#[cfg(test)]
mod tests;

pub use counter::*;
pub use interface::*;
