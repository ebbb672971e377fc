//! Mutation hooks
//!
//! Hooks run on the caller's task while the cache write lock is held, so
//! they must be cheap and must never call back into the cache.

use std::sync::Arc;
use tracing::debug;

/// Observer for `set`, `add` and `delete`: `(key, value)`
pub type EntryHook<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Observer for `replace`: `(key, old_value, new_value)`
pub type ReplaceHook<V> = Arc<dyn Fn(&str, &V, &V) + Send + Sync>;

pub(crate) struct Hooks<V> {
    pub on_set: EntryHook<V>,
    pub on_delete: EntryHook<V>,
    pub on_add: EntryHook<V>,
    pub on_replace: ReplaceHook<V>,
}

impl<V: 'static> Default for Hooks<V> {
    fn default() -> Self {
        Self {
            on_set: Arc::new(|key: &str, _: &V| debug!(key = %key, "Cache entry set")),
            on_delete: Arc::new(|key: &str, _: &V| debug!(key = %key, "Cache entry deleted")),
            on_add: Arc::new(|key: &str, _: &V| debug!(key = %key, "Cache entry added")),
            on_replace: Arc::new(|key: &str, _: &V, _: &V| {
                debug!(key = %key, "Cache entry replaced")
            }),
        }
    }
}
