//! Key to on-disk artifact name mapping

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Derive the artifact file name for a key written with the given expiry.
///
/// A fresh hasher is used for every call. The name is 64 lowercase hex
/// characters and differs for any two expiries within the nanosecond range
/// (years 1677 to 2262). Beyond that only microseconds are hashed, so expiries
/// saturated to the maximum repeat the same name for a key.
pub fn artifact_id(key: &str, expires_at: DateTime<Utc>) -> String {
    // Out-of-range timestamps (beyond ~year 2262) fall back to micros
    let stamp = expires_at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| expires_at.timestamp_micros());

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(stamp.to_be_bytes());
    hex::encode(hasher.finalize())
}

pub fn artifact_path(dir: &Path, artifact_id: &str) -> PathBuf {
    dir.join(artifact_id)
}
