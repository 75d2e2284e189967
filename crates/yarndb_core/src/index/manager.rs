//! Registry of field indexes.

use crate::error::{CoreError, CoreResult};
use crate::index::FieldIndex;
use crate::types::FieldPath;
use std::collections::{BTreeMap, HashMap};
use yarndb_codec::Value;

/// All indexes of a datastore, keyed by path.
///
/// The manager keeps every index in step with the records: callers report
/// each put and delete, and the manager forwards it to every index.
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: BTreeMap<FieldPath, FieldIndex>,
}

impl IndexManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index on `path` and fills it from `records`.
    ///
    /// Returns the number of records entered.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexExists`] if the path is already indexed.
    pub fn create(
        &mut self,
        path: FieldPath,
        records: &HashMap<String, Value>,
    ) -> CoreResult<usize> {
        if self.indexes.contains_key(&path) {
            return Err(CoreError::index_exists(path.as_str()));
        }
        let index = FieldIndex::build(path.clone(), records);
        let entered = index.len();
        self.indexes.insert(path, index);
        Ok(entered)
    }

    /// Returns the index on `path`, if any.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldIndex> {
        self.indexes.get(path)
    }

    /// Returns true if `path` is indexed.
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.indexes.contains_key(path)
    }

    /// Reports that `id` now holds `document`.
    pub fn on_put(&mut self, id: &str, document: &Value) {
        for index in self.indexes.values_mut() {
            index.insert(id, document);
        }
    }

    /// Reports that `id` was deleted.
    pub fn on_delete(&mut self, id: &str) {
        for index in self.indexes.values_mut() {
            index.remove(id);
        }
    }

    /// Indexed paths, in path order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.indexes.keys().map(|p| p.as_str().to_string()).collect()
    }

    /// Number of indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if there are no indexes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    fn records() -> HashMap<String, Value> {
        let mut records = HashMap::new();
        records.insert("u1".to_string(), Value::map([("dept", "eng")]));
        records.insert("u2".to_string(), Value::map([("dept", "ops")]));
        records
    }

    #[test]
    fn create_builds_from_records() {
        let mut manager = IndexManager::new();
        assert_eq!(manager.create(path("dept"), &records()).unwrap(), 2);

        let index = manager.get(&path("dept")).unwrap();
        assert_eq!(index.last_holder(&Value::from("ops")), Some("u2"));
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let mut manager = IndexManager::new();
        manager.create(path("dept"), &records()).unwrap();
        let err = manager.create(path("dept"), &records()).unwrap_err();
        assert!(matches!(err, CoreError::IndexExists { ref path } if path == "dept"));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn puts_and_deletes_reach_every_index() {
        let mut manager = IndexManager::new();
        manager.create(path("dept"), &HashMap::new()).unwrap();
        manager.create(path("name"), &HashMap::new()).unwrap();

        manager.on_put("u1", &Value::map([("dept", "eng"), ("name", "Ann")]));
        assert!(manager.get(&path("dept")).unwrap().contains("u1"));
        assert!(manager.get(&path("name")).unwrap().contains("u1"));

        manager.on_delete("u1");
        assert!(manager.get(&path("dept")).unwrap().is_empty());
        assert!(manager.get(&path("name")).unwrap().is_empty());
    }

    #[test]
    fn paths_are_sorted() {
        let mut manager = IndexManager::new();
        manager.create(path("name"), &HashMap::new()).unwrap();
        manager.create(path("address.city"), &HashMap::new()).unwrap();
        assert_eq!(manager.paths(), ["address.city", "name"]);
        assert!(manager.contains(&path("name")));
        assert!(!manager.contains(&path("dept")));
    }
}
