mod allocator;
mod error;
mod format;
#[cfg(feature = "futures")]
mod futures;
mod ledger;
mod partition;
mod retry;
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;
mod seed;
mod serial;
mod store;
mod sync;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::format::*;
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::ledger::*;
pub use crate::partition::*;
pub use crate::retry::*;
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
pub use crate::runtime::*;
pub use crate::seed::*;
pub use crate::serial::*;
pub use crate::store::*;
