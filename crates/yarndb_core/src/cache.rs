//! Cached merged view of all committed records.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use yarndb_codec::Value;

/// Every committed record, keyed by id.
pub type MergedView = Arc<HashMap<String, Value>>;

/// Holds the last merged view until the next mutation.
///
/// Callers fill the cache while holding the data read lock and clear it
/// while holding the data write lock, so a cached view is never older than
/// the records it was built from.
#[derive(Debug, Default)]
pub(crate) struct MergeCache {
    slot: RwLock<Option<MergedView>>,
}

impl MergeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached view, building and storing it on a miss.
    pub fn get_or_build(&self, build: impl FnOnce() -> HashMap<String, Value>) -> MergedView {
        if let Some(view) = self.slot.read().as_ref() {
            return Arc::clone(view);
        }
        let mut slot = self.slot.write();
        Arc::clone(slot.get_or_insert_with(|| Arc::new(build())))
    }

    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    #[cfg(test)]
    pub fn is_populated(&self) -> bool {
        self.slot.read().is_some()
    }
}
