//! Deduplicating, reference-counted store of visual resources.
//!
//! Every `acquire` must be paired with exactly one `release`. Loads for the
//! same key are coalesced: while a key is loading, further acquires share the
//! in-flight task instead of starting a new one.

mod cache;
mod entry;
mod error;
mod future;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{CacheStats, ResourceCache};
pub use entry::{EntryStatus, ResourceHandle};
pub use error::{ResourceLoadError, UnderflowError};
pub use future::ResourceFuture;

pub use asset::{ResourceCategory, ResourceKey};
