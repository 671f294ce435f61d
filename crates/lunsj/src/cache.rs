//! On-disk cache of the raw menu pages.
//!
//! Every location gets its own `<LOCATION>_LunchMenuCache.json` file holding the
//! last fetched HTML and the Unix time it was fetched at. Entries older than
//! [`CACHE_TTL`] are still returned, flagged as expired, so the caller decides
//! whether to go to the network.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::container::write_atomically;
use crate::types::Location;

pub const CACHE_TTL: Duration = Duration::seconds(7200);
pub const CACHE_FILE_SUFFIX: &str = "_LunchMenuCache.json";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exact on-disk shape. Anything else is treated as a miss.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheFile {
    data: String,
    timestamp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub raw_html: String,
    pub fetched_at: DateTime<Utc>,
    pub is_expired: bool,
}

/// Sent to subscribers after the cache contents change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Saved(Location),
    Cleared,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    events: broadcast::Sender<CacheEvent>,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            cache_dir: cache_dir.into(),
            events,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Receives a [`CacheEvent`] after every successful save or clear made
    /// through this store or one of its clones. Events sent before the call are
    /// not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub fn cache_path(&self, location: Location) -> PathBuf {
        self.cache_dir
            .join(format!("{}{}", location.key(), CACHE_FILE_SUFFIX))
    }

    /// Stores `html` for `location`. Blank input is ignored and leaves any
    /// previous entry in place.
    pub fn save(&self, location: Location, html: &str) -> Result<(), CacheError> {
        self.save_at(location, html, Utc::now())
    }

    pub(crate) fn save_at(
        &self,
        location: Location,
        html: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        if html.trim().is_empty() {
            log::warn!("Refusing to cache an empty page for {}", location);
            return Ok(());
        }

        let file = CacheFile {
            data: html.to_string(),
            timestamp: fetched_at.timestamp_millis() as f64 / 1000.0,
        };
        let json = serde_json::to_vec(&file)?;
        write_atomically(&self.cache_path(location), &json)?;
        log::debug!("Saved {} menu to cache", location);

        // No subscribers is not an error.
        let _ = self.events.send(CacheEvent::Saved(location));
        Ok(())
    }

    pub fn load(&self, location: Location) -> Option<CacheEntry> {
        self.load_at(location, Utc::now())
    }

    pub fn load_at(&self, location: Location, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.cache_path(location);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read cache {}: {}", path.display(), e);
                return None;
            }
        };

        let file: CacheFile = serde_json::from_str(&content)
            .inspect_err(|e| log::warn!("Ignoring malformed cache {}: {}", path.display(), e))
            .ok()?;
        if !file.timestamp.is_finite() {
            log::warn!("Ignoring cache {} with invalid timestamp", path.display());
            return None;
        }
        let fetched_at = DateTime::from_timestamp_millis((file.timestamp * 1000.0).round() as i64)?;

        // A timestamp from the future cannot be trusted to ever age out.
        let age = now.signed_duration_since(fetched_at);
        Some(CacheEntry {
            raw_html: file.data,
            fetched_at,
            is_expired: age < Duration::zero() || age > CACHE_TTL,
        })
    }

    /// Removes every cache file in the cache directory and returns how many
    /// were deleted. Failures are logged and skipped.
    pub fn clear_all(&self) -> usize {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!("Failed to list caches in {}: {}", self.cache_dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    log::warn!("Failed to read cache directory entry: {}", e);
                    continue;
                }
            };
            let is_cache_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(CACHE_FILE_SUFFIX));
            if !is_cache_file {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("Cleared cache: {}", path.display());
                    removed += 1;
                }
                Err(e) => log::warn!("Failed to clear cache {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            let _ = self.events.send(CacheEvent::Cleared);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HTML: &str = "<table><tr><th>Dag</th></tr></table>";

    fn create_test_cache() -> (CacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheStore::new(temp_dir.path());
        (cache, temp_dir)
    }

    fn write_raw(cache: &CacheStore, location: Location, json: &str) {
        fs::create_dir_all(cache.cache_dir()).unwrap();
        fs::write(cache.cache_path(location), json).unwrap();
    }

    #[test]
    fn test_save_then_load_is_fresh() {
        let (cache, _temp_dir) = create_test_cache();

        cache.save(Location::N58, HTML).expect("Save should succeed");
        let entry = cache.load(Location::N58).expect("Entry should exist");

        assert_eq!(entry.raw_html, HTML);
        assert!(!entry.is_expired);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.load(Location::Fb38).is_none());
    }

    #[test]
    fn test_file_name_and_format() {
        let (cache, temp_dir) = create_test_cache();

        cache.save(Location::Fb38, HTML).unwrap();

        let path = temp_dir.path().join("FB38_LunchMenuCache.json");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let object = value.as_object().expect("Cache file should be an object");
        assert_eq!(object.len(), 2);
        assert_eq!(object["data"], HTML);
        assert!(object["timestamp"].is_number());
    }

    #[test]
    fn test_expiry_boundary() {
        let (cache, _temp_dir) = create_test_cache();
        let now = Utc::now();

        write_raw(
            &cache,
            Location::N58,
            &format!(r#"{{"data": "x", "timestamp": {}}}"#, now.timestamp() - 7199),
        );
        let entry = cache.load_at(Location::N58, now).unwrap();
        assert!(!entry.is_expired, "7199 seconds old should be fresh");

        write_raw(
            &cache,
            Location::N58,
            &format!(r#"{{"data": "x", "timestamp": {}}}"#, now.timestamp() - 7201),
        );
        let entry = cache.load_at(Location::N58, now).unwrap();
        assert!(entry.is_expired, "7201 seconds old should be expired");
    }

    #[test]
    fn test_reads_fractional_timestamps() {
        let (cache, _temp_dir) = create_test_cache();
        write_raw(
            &cache,
            Location::Fb38,
            r#"{"data":"<p>hei</p>","timestamp":1729260000.25}"#,
        );

        let entry = cache.load(Location::Fb38).unwrap();

        assert_eq!(entry.fetched_at.timestamp_millis(), 1_729_260_000_250);
        assert!(entry.is_expired);
    }

    #[test]
    fn test_future_timestamp_is_expired() {
        let (cache, _temp_dir) = create_test_cache();
        let now = Utc::now();
        write_raw(
            &cache,
            Location::Fb38,
            &format!(r#"{{"data": "x", "timestamp": {}}}"#, now.timestamp() + 3600),
        );

        let entry = cache.load_at(Location::Fb38, now).unwrap();

        assert!(entry.is_expired);
    }

    #[test]
    fn test_blank_save_is_noop() {
        let (cache, _temp_dir) = create_test_cache();

        cache.save(Location::N58, "").unwrap();
        cache.save(Location::N58, "   ").unwrap();
        assert!(cache.load(Location::N58).is_none());

        cache.save(Location::N58, HTML).unwrap();
        cache.save(Location::N58, " \n ").unwrap();
        assert_eq!(cache.load(Location::N58).unwrap().raw_html, HTML);
    }

    #[test]
    fn test_malformed_files_are_misses() {
        let (cache, _temp_dir) = create_test_cache();
        let cases = [
            "not json",
            r#"{"data": "x"}"#,
            r#"{"timestamp": 1}"#,
            r#"{"data": 1, "timestamp": 1}"#,
            r#"{"data": "x", "timestamp": "yesterday"}"#,
            r#"{"data": "x", "timestamp": 1, "etag": "abc"}"#,
        ];

        for json in cases {
            write_raw(&cache, Location::Fb38, json);
            assert!(cache.load(Location::Fb38).is_none(), "{} should be a miss", json);
        }
    }

    #[test]
    fn test_locations_are_partitioned() {
        let (cache, _temp_dir) = create_test_cache();

        cache.save(Location::Fb38, "<p>fb38</p>").unwrap();
        cache.save(Location::N58, "<p>n58</p>").unwrap();
        cache.save(Location::Fb38, "<p>fb38 v2</p>").unwrap();

        assert_eq!(cache.load(Location::Fb38).unwrap().raw_html, "<p>fb38 v2</p>");
        assert_eq!(cache.load(Location::N58).unwrap().raw_html, "<p>n58</p>");
    }

    #[test]
    fn test_clear_all_removes_only_cache_files() {
        let (cache, temp_dir) = create_test_cache();
        cache.save(Location::Fb38, HTML).unwrap();
        cache.save(Location::N58, HTML).unwrap();
        fs::write(temp_dir.path().join("settings.json"), "{}").unwrap();

        assert_eq!(cache.clear_all(), 2);
        assert!(cache.load(Location::Fb38).is_none());
        assert!(cache.load(Location::N58).is_none());
        assert!(temp_dir.path().join("settings.json").exists());

        assert_eq!(cache.clear_all(), 0, "Clearing twice should be harmless");
    }

    #[test]
    fn test_clear_all_on_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheStore::new(temp_dir.path().join("does").join("not").join("exist"));
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheStore::new(temp_dir.path().join("nested").join("caches"));

        cache.save(Location::N58, HTML).expect("Save should create the directory");

        assert!(cache.cache_path(Location::N58).exists());
    }

    #[test]
    fn test_subscribers_are_notified() {
        let (cache, _temp_dir) = create_test_cache();
        let mut events = cache.subscribe();

        cache.save(Location::Fb38, "").unwrap();
        assert!(events.try_recv().is_err(), "Blank save should not notify");

        cache.save(Location::Fb38, HTML).unwrap();
        assert_eq!(events.try_recv().unwrap(), CacheEvent::Saved(Location::Fb38));

        cache.clear_all();
        assert_eq!(events.try_recv().unwrap(), CacheEvent::Cleared);
    }
}
