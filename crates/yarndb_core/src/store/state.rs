use super::field_matches;
use crate::error::CoreResult;
use crate::index::IndexManager;
use crate::types::{FieldPath, ShardId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use yarndb_codec::{IndexKey, ShardRecords, Value};

/// How a query was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryRoute {
    Index,
    Scan,
}

/// What a save has to do to bring the shard files in line with memory.
#[derive(Debug, Default)]
pub(crate) struct FlushPlan {
    /// Non-empty shards and their records.
    pub groups: BTreeMap<ShardId, ShardRecords>,
    /// Shards that exist on disk but no longer hold any record.
    pub stale: Vec<ShardId>,
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    records: HashMap<String, Value>,
    assignments: HashMap<String, ShardId>,
    /// Shards with a file on disk, as of the last load or save.
    persisted: BTreeSet<ShardId>,
    indexes: IndexManager,
    dirty: bool,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn records(&self) -> &HashMap<String, Value> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    #[cfg(test)]
    pub fn shard_of(&self, id: &str) -> Option<&ShardId> {
        self.assignments.get(id)
    }

    /// Number of distinct shards currently holding records.
    pub fn shard_count(&self) -> usize {
        self.assignments.values().collect::<BTreeSet<_>>().len()
    }

    /// Inserts or replaces a record.
    pub fn put(&mut self, id: String, document: Value, shard: ShardId) {
        self.indexes.on_put(&id, &document);
        self.assignments.insert(id.clone(), shard);
        self.records.insert(id, document);
        self.dirty = true;
    }

    /// Removes a record, returning its document if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Value> {
        let removed = self.records.remove(id)?;
        self.indexes.on_delete(id);
        self.assignments.remove(id);
        self.dirty = true;
        Some(removed)
    }

    /// Merges the records of one loaded shard file. Records already
    /// present are replaced. Loading does not make the state dirty.
    pub fn load_shard(&mut self, shard: &ShardId, records: ShardRecords) -> usize {
        let loaded = records.len();
        for (id, document) in records {
            self.indexes.on_put(&id, &document);
            self.assignments.insert(id.clone(), shard.clone());
            self.records.insert(id, document);
        }
        self.persisted.insert(shard.clone());
        loaded
    }

    pub fn create_index(&mut self, path: FieldPath) -> CoreResult<usize> {
        self.indexes.create(path, &self.records)
    }

    /// Records whose value at `path` equals `value`.
    pub fn query(&self, path: &FieldPath, value: &Value) -> (HashMap<String, Value>, QueryRoute) {
        if let Some(index) = self.indexes.get(path) {
            let found = index
                .holders(value)
                .filter_map(|id| {
                    self.records
                        .get(id)
                        .map(|doc| (id.to_string(), doc.clone()))
                })
                .collect();
            return (found, QueryRoute::Index);
        }

        let key = IndexKey::of(value);
        let found = self
            .records
            .iter()
            .filter(|(_, doc)| field_matches(path, doc, &key))
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();
        (found, QueryRoute::Scan)
    }

    /// Groups records by shard and lists shards left empty.
    pub fn flush_plan(&self, default_shard: &ShardId) -> FlushPlan {
        let mut groups: BTreeMap<ShardId, ShardRecords> = BTreeMap::new();
        for (id, document) in &self.records {
            let shard = self.assignments.get(id).unwrap_or(default_shard);
            groups
                .entry(shard.clone())
                .or_default()
                .insert(id.clone(), document.clone());
        }
        let stale = self
            .persisted
            .iter()
            .filter(|shard| !groups.contains_key(*shard))
            .cloned()
            .collect();
        FlushPlan { groups, stale }
    }

    pub fn mark_persisted(&mut self, shard: ShardId) {
        self.persisted.insert(shard);
    }

    pub fn forget_persisted(&mut self, shard: &ShardId) {
        self.persisted.remove(shard);
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
