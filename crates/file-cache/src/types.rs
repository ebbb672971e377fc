//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CACHE_DIR: &str = "./cache/files";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Metadata for one cached key: where its value lives and when it expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// File name of the serialized value inside the cache directory
    pub artifact_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Entry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries reclaimed because they expired, by `get` or by a sweep
    pub expired_evictions: u64,
}

/// Configuration for a cache instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    /// `None` runs without a background sweeper
    pub sweep_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)),
        }
    }
}

impl CacheConfig {
    /// Load configuration from `CACHE_DIR` and `SWEEP_INTERVAL_SECS`.
    ///
    /// Missing or unparseable values fall back to the defaults. An interval
    /// of `0` disables the sweeper.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_dir = std::env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let sweep_interval = match std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.sweep_interval,
        };

        Self {
            cache_dir,
            sweep_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.expired_evictions, 0);
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./cache/files"));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_entry_expiry() {
        let now = Utc::now();
        let entry = Entry {
            artifact_id: "abc".to_string(),
            expires_at: now,
        };

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + chrono::Duration::nanoseconds(1)));
        assert!(!entry.is_expired_at(now - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = Entry {
            artifact_id: "0123abcd".to_string(),
            expires_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("0123abcd"));

        let deserialized: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }
}
