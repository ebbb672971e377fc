//! File-backed key/value cache with TTL expiration
//!
//! Values are serialized to one file per entry inside a cache directory,
//! while an in-memory index tracks which keys exist, where their artifact
//! lives and when they expire. Mutations fire observation hooks and an
//! optional background sweeper reclaims expired entries.

mod artifact;
mod cache;
mod codec;
mod error;
mod hooks;
mod index;
mod sweeper;
mod types;

pub use artifact::{artifact_id, artifact_path};
pub use cache::FileCache;
pub use codec::{Codec, CodecError, JsonCodec};
pub use error::{CacheError, Result};
pub use hooks::{EntryHook, ReplaceHook};
pub use index::Index;
pub use types::{CacheConfig, CacheStats, Entry};
