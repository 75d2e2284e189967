//! Index over a single field path.

use crate::types::FieldPath;
use std::collections::{BTreeMap, HashMap};
use yarndb_codec::{IndexKey, Value};

/// Exact-match index over one [`FieldPath`].
///
/// Every record whose document has a value at the path is entered under
/// that value's [`IndexKey`]. Holders of one value are kept in write order,
/// so [`FieldIndex::last_holder`] reports the record that most recently
/// wrote the value while [`FieldIndex::holders`] reports all of them.
///
/// # Example
///
/// ```rust
/// use yarndb_core::{FieldIndex, FieldPath, Value};
///
/// let mut index = FieldIndex::new(FieldPath::parse("dept").unwrap());
/// index.insert("u1", &Value::map([("dept", "eng")]));
/// index.insert("u2", &Value::map([("dept", "eng")]));
///
/// let eng = Value::from("eng");
/// assert_eq!(index.holders(&eng).count(), 2);
/// assert_eq!(index.last_holder(&eng), Some("u2"));
/// ```
#[derive(Debug, Clone)]
pub struct FieldIndex {
    path: FieldPath,
    /// Key to holders, by write stamp.
    entries: HashMap<IndexKey, BTreeMap<u64, String>>,
    /// Record id to the key and stamp it was entered under.
    reverse: HashMap<String, (IndexKey, u64)>,
    next_stamp: u64,
}

impl FieldIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(path: FieldPath) -> Self {
        Self {
            path,
            entries: HashMap::new(),
            reverse: HashMap::new(),
            next_stamp: 0,
        }
    }

    /// Builds an index from existing records.
    ///
    /// Records are entered in id order so the build is deterministic.
    pub fn build<'a, I>(path: FieldPath, records: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut sorted: Vec<_> = records.into_iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut index = Self::new(path);
        for (id, document) in sorted {
            index.insert(id, document);
        }
        index
    }

    /// Returns the indexed path.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Enters a record's current document, replacing whatever the record
    /// contributed before. Documents without a value at the path leave the
    /// record out of the index.
    pub fn insert(&mut self, id: &str, document: &Value) {
        self.remove(id);
        let Some(value) = self.path.evaluate(document) else {
            return;
        };

        let key = IndexKey::of(value);
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        self.entries
            .entry(key.clone())
            .or_default()
            .insert(stamp, id.to_string());
        self.reverse.insert(id.to_string(), (key, stamp));
    }

    /// Removes a record. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some((key, stamp)) = self.reverse.remove(id) else {
            return false;
        };
        if let Some(holders) = self.entries.get_mut(&key) {
            holders.remove(&stamp);
            if holders.is_empty() {
                self.entries.remove(&key);
            }
        }
        true
    }

    /// Returns every record holding `value`, oldest write first.
    pub fn holders(&self, value: &Value) -> impl Iterator<Item = &str> {
        self.entries
            .get(&IndexKey::of(value))
            .into_iter()
            .flat_map(|holders| holders.values().map(String::as_str))
    }

    /// Returns the record that most recently wrote `value`.
    #[must_use]
    pub fn last_holder(&self, value: &Value) -> Option<&str> {
        self.entries
            .get(&IndexKey::of(value))
            .and_then(|holders| holders.values().next_back())
            .map(String::as_str)
    }

    /// Returns whether a record is entered in the index.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.reverse.contains_key(id)
    }

    /// Number of distinct indexed values.
    #[must_use]
    pub fn distinct_values(&self) -> usize {
        self.entries.len()
    }

    /// Number of records entered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Returns true if no record is entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept_index() -> FieldIndex {
        FieldIndex::new(FieldPath::parse("dept").unwrap())
    }

    fn doc(dept: &str) -> Value {
        Value::map([("dept", dept)])
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = dept_index();
        index.insert("u1", &doc("eng"));
        index.insert("u2", &doc("ops"));

        let eng = Value::from("eng");
        assert_eq!(index.holders(&eng).collect::<Vec<_>>(), ["u1"]);
        assert_eq!(index.last_holder(&Value::from("ops")), Some("u2"));
        assert_eq!(index.last_holder(&Value::from("hr")), None);
        assert_eq!(index.distinct_values(), 2);
    }

    #[test]
    fn last_writer_wins_single_lookup() {
        let mut index = dept_index();
        index.insert("u1", &doc("eng"));
        index.insert("u2", &doc("eng"));
        index.insert("u1", &doc("eng"));

        let eng = Value::from("eng");
        assert_eq!(index.last_holder(&eng), Some("u1"));
        assert_eq!(index.holders(&eng).collect::<Vec<_>>(), ["u2", "u1"]);
    }

    #[test]
    fn update_moves_record() {
        let mut index = dept_index();
        index.insert("u1", &doc("eng"));
        index.insert("u1", &doc("ops"));

        assert_eq!(index.holders(&Value::from("eng")).count(), 0);
        assert_eq!(index.last_holder(&Value::from("ops")), Some("u1"));
        assert_eq!(index.distinct_values(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn documents_without_the_field_are_skipped() {
        let mut index = dept_index();
        index.insert("u1", &doc("eng"));
        index.insert("u1", &Value::map([("name", "Ann")]));

        assert!(!index.contains("u1"));
        assert!(index.is_empty());
        assert_eq!(index.distinct_values(), 0);
    }

    #[test]
    fn remove_reports_presence() {
        let mut index = dept_index();
        index.insert("u1", &doc("eng"));
        assert!(index.remove("u1"));
        assert!(!index.remove("u1"));
        assert_eq!(index.last_holder(&Value::from("eng")), None);
    }

    #[test]
    fn matching_is_typed() {
        let mut index = FieldIndex::new(FieldPath::parse("n").unwrap());
        index.insert("a", &Value::map([("n", 1)]));
        index.insert("b", &Value::map([("n", 1.0)]));

        assert_eq!(index.last_holder(&Value::from(1)), Some("a"));
        assert_eq!(index.last_holder(&Value::from(1.0)), Some("b"));
    }

    #[test]
    fn nested_paths_and_structured_values() {
        let mut index = FieldIndex::new(FieldPath::parse("address.city").unwrap());
        let oslo = Value::map([("address", Value::map([("city", "Oslo")]))]);
        index.insert("u1", &oslo);
        index.insert("u2", &Value::map([("address", "Oslo")]));

        assert_eq!(index.last_holder(&Value::from("Oslo")), Some("u1"));
        assert!(!index.contains("u2"));

        let mut tags = FieldIndex::new(FieldPath::parse("tags").unwrap());
        tags.insert("t1", &Value::map([("tags", vec!["a", "b"])]));
        assert_eq!(tags.last_holder(&Value::from(vec!["a", "b"])), Some("t1"));
        assert_eq!(tags.last_holder(&Value::from(vec!["b", "a"])), None);
    }

    #[test]
    fn build_from_records() {
        let mut records = HashMap::new();
        records.insert("u2".to_string(), doc("eng"));
        records.insert("u1".to_string(), doc("eng"));
        records.insert("u3".to_string(), Value::Null);

        let index = FieldIndex::build(FieldPath::parse("dept").unwrap(), &records);
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.holders(&Value::from("eng")).collect::<Vec<_>>(),
            ["u1", "u2"]
        );
    }
}
