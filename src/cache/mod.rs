//! Caching layer: size-bounded LRU plus the shared, mutex-guarded wrappers.

pub mod locked;
pub mod sizedlru;

pub use locked::{LockedCache, StringCache, StubCache};
pub use sizedlru::SizedLru;
