//! Caches in front of a [`Backend`](crate::backend::Backend).
//!
//! Both caches are plain values owned by one host cycle. Persistence happens
//! only through their explicit `load`/`save` calls. Files are written in
//! place without locking; concurrent cycles for the same host overwrite each
//! other and the last write wins.

mod single;
mod walk;

pub use single::{BackendLookup, CacheStats, SingleValueCache};
pub use walk::WalkCache;
