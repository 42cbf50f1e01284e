//! File-backed asset cache

use crate::types::CacheStats;
use sha2::{Digest, Sha256};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

/// A byte-blob cache backed by a flat file directory.
///
/// Each entry is one file named by the SHA-256 hex digest of its URL. The
/// file's last-modified timestamp is the only freshness signal: entries
/// older than `max_age` are treated as stale, deleted when encountered, and
/// never served. Writes are unsynchronized; concurrent stores of the same
/// key race and the last write wins.
pub struct AssetCache {
    /// Directory where cached blobs are stored
    cache_dir: PathBuf,
    /// Age past which an entry is stale
    max_age: Duration,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
}

impl AssetCache {
    /// Create a new asset cache. Does not touch the filesystem until
    /// [`init`](Self::init) is called.
    pub fn new(cache_dir: PathBuf, max_age: Duration) -> Self {
        Self {
            cache_dir,
            max_age,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Ensure the cache directory exists, then sweep out entries that
    /// expired since the last run.
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        let removed = self.sweep_expired().await?;
        info!(cache_dir = ?self.cache_dir, removed, "Cache initialized");
        Ok(())
    }

    /// Derive the cache key for a resource URL
    pub fn cache_key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fetch a resource from the cache, returning its bytes if present and
    /// fresh. A stale entry is deleted and reported as a miss.
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        let key = Self::cache_key(url);
        let path = self.cache_dir.join(&key);

        let modified = match fs::metadata(&path).await {
            Ok(meta) => meta.modified().ok(),
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        // An unreadable timestamp counts as stale.
        if !modified.is_some_and(|m| self.is_fresh(m)) {
            debug!(key = %key, "Cache entry expired");
            let _ = fs::remove_file(&path).await;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match fs::read(&path).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, size = data.len(), "Cache hit");
                Some(data)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached file");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a resource, overwriting any previous entry for the same URL.
    pub async fn put(&self, url: &str, data: &[u8]) -> io::Result<()> {
        let key = Self::cache_key(url);
        let path = self.cache_dir.join(&key);
        fs::write(&path, data).await?;
        debug!(key = %key, size = data.len(), "Cached resource");
        Ok(())
    }

    /// Delete every entry older than the maximum age. Returns how many
    /// files were removed; per-file errors are logged and skipped.
    pub async fn sweep_expired(&self) -> io::Result<usize> {
        let mut removed = 0;
        let mut dir = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let fresh = match entry.metadata().await {
                Ok(meta) => meta.modified().ok().is_some_and(|m| self.is_fresh(m)),
                // Vanished or unreadable since listing: treat as stale.
                Err(_) => false,
            };

            if !fresh {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(path = ?entry.path(), error = %e, "Failed to remove expired entry")
                    }
                }
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
        Ok(removed)
    }

    /// Snapshot the cache by scanning the directory.
    pub async fn stats(&self) -> CacheStats {
        let mut entries = 0;
        let mut total_size = 0;

        if let Ok(mut dir) = fs::read_dir(&self.cache_dir).await {
            while let Ok(Some(entry)) = dir.next_entry().await {
                if let Ok(meta) = entry.metadata().await {
                    entries += 1;
                    total_size += meta.len();
                }
            }
        }

        CacheStats {
            entries,
            total_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_fresh(&self, modified: SystemTime) -> bool {
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= self.max_age,
            // Timestamp in the future: clock skew, treat as fresh.
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cache_with_max_age(dir: &std::path::Path, max_age: Duration) -> AssetCache {
        AssetCache::new(dir.to_path_buf(), max_age)
    }

    #[test]
    fn test_cache_key_derivation() {
        let key1 = AssetCache::cache_key("https://example.com/app.js");
        let key2 = AssetCache::cache_key("https://example.com/app.js");
        let key3 = AssetCache::cache_key("https://example.com/app.css");

        // Same URL produces the same key
        assert_eq!(key1, key2);

        // Different URLs produce different keys
        assert_ne!(key1, key3);

        // Keys are hex strings (64 chars for SHA256)
        assert_eq!(key1.len(), 64);
        assert!(key1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        let url = "https://example.com/logo.png";
        cache.put(url, b"png bytes").await.unwrap();

        let data = cache.get(url).await;
        assert_eq!(data.as_deref(), Some(&b"png bytes"[..]));
    }

    #[tokio::test]
    async fn test_get_missing_is_miss() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        assert!(cache.get("https://example.com/absent.css").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_entry() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        let url = "https://example.com/style.css";
        cache.put(url, b"old").await.unwrap();
        cache.put(url, b"new").await.unwrap();

        assert_eq!(cache.get(url).await.as_deref(), Some(&b"new"[..]));

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_deleted_on_read() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::ZERO);
        cache.init().await.unwrap();

        let url = "https://example.com/old.js";
        cache.put(url, b"stale bytes").await.unwrap();

        // Let the entry age past the zero-length freshness window.
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(cache.get(url).await.is_none());

        // The stale file is gone, not just skipped.
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_init_sweeps_expired_entries() {
        let dir = tempdir().unwrap();

        // Populate through one cache instance.
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();
        cache.put("https://example.com/a.js", b"a").await.unwrap();
        cache.put("https://example.com/b.css", b"b").await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        // A fresh instance with a zero window sweeps everything at init.
        let reopened = cache_with_max_age(dir.path(), Duration::ZERO);
        reopened.init().await.unwrap();

        let stats = reopened.stats().await;
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        cache.put("https://example.com/a.js", b"a").await.unwrap();
        let removed = cache.sweep_expired().await.unwrap();

        assert_eq!(removed, 0);
        assert!(cache.get("https://example.com/a.js").await.is_some());
    }

    #[tokio::test]
    async fn test_hit_and_miss_counters() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        cache.get("https://example.com/x.png").await;
        cache.put("https://example.com/x.png", b"data").await.unwrap();
        cache.get("https://example.com/x.png").await;

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_stats_reflect_directory_contents() {
        let dir = tempdir().unwrap();
        let cache = cache_with_max_age(dir.path(), Duration::from_secs(3600));
        cache.init().await.unwrap();

        cache
            .put("https://example.com/a.js", b"0123456789")
            .await
            .unwrap();
        cache
            .put("https://example.com/b.css", b"abcde")
            .await
            .unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.total_size, 15);
    }
}
