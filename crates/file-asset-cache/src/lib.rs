//! File-based static asset cache with mtime-driven expiration
//!
//! Stores opaque byte blobs on disk, keyed by a SHA-256 digest of the
//! resource URL. The filesystem is the sole source of truth: freshness is
//! judged by each file's last-modified timestamp against a fixed maximum
//! age, stale entries are deleted lazily on read or by a sweep at startup,
//! and no metadata is kept beyond the files themselves.

mod cache;
mod types;

pub use cache::AssetCache;
pub use types::CacheStats;
