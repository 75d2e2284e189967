//! Cross-crate integration test helpers.
//!
//! Provides a harness that mirrors every write into a plain map and checks
//! the datastore against it.

use crate::fixtures::TestDatastore;
use crate::generators::RecordOperation;
use std::collections::HashMap;
use yarndb_codec::IndexKey;
use yarndb_core::{CoreError, FieldPath, Value};

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The datastore under test.
    pub store: TestDatastore,
    /// Records the datastore is expected to hold.
    model: HashMap<String, Value>,
}

impl IntegrationHarness {
    /// Creates a harness over an in-memory datastore.
    pub fn new() -> Self {
        Self::over(TestDatastore::memory())
    }

    /// Creates a harness over an existing test datastore, adopting its
    /// current records as the model.
    pub fn over(store: TestDatastore) -> Self {
        let model = (*store.merge().expect("Failed to merge")).clone();
        Self { store, model }
    }

    /// Sets a record and tracks it.
    pub fn set(&mut self, id: &str, document: Value, hint: &str) {
        self.store
            .set(id, document.clone(), hint)
            .expect("Failed to set record");
        self.model.insert(id.to_string(), document);
    }

    /// Deletes a record, expecting `NotFound` when the model lacks it.
    pub fn delete(&mut self, id: &str) {
        match self.store.delete(id) {
            Ok(()) => {
                assert!(
                    self.model.remove(id).is_some(),
                    "deleted {id} which should not exist"
                );
            }
            Err(CoreError::NotFound { .. }) => {
                assert!(!self.model.contains_key(id), "{id} should exist");
            }
            Err(err) => panic!("Failed to delete {id}: {err}"),
        }
    }

    /// Reads a record and checks it against the model.
    pub fn get_and_verify(&self, id: &str) -> Option<Value> {
        let actual = self.store.get(id).expect("Failed to get record");
        assert_eq!(actual.as_ref(), self.model.get(id), "record {id} mismatch");
        actual
    }

    /// Applies one generated operation directly.
    pub fn apply(&mut self, op: &RecordOperation) {
        match op {
            RecordOperation::Set { id, document, hint } => self.set(id, document.clone(), hint),
            RecordOperation::Delete { id } => self.delete(id),
            RecordOperation::Get { id } => {
                self.get_and_verify(id);
            }
        }
    }

    /// Applies a batch of operations inside one transaction.
    ///
    /// Reads inside the batch are checked against the model as it stands
    /// mid-batch.
    pub fn apply_in_transaction(&mut self, ops: &[RecordOperation]) {
        let mut staged = self.model.clone();
        self.store
            .transaction(|txn| {
                for op in ops {
                    match op {
                        RecordOperation::Set { id, document, hint } => {
                            txn.set(id, document.clone(), hint)?;
                            staged.insert(id.clone(), document.clone());
                        }
                        RecordOperation::Delete { id } => {
                            txn.delete(id)?;
                            staged.remove(id);
                        }
                        RecordOperation::Get { id } => {
                            assert_eq!(txn.get(id)?.as_ref(), staged.get(id));
                        }
                    }
                }
                Ok(())
            })
            .expect("Failed to commit batch");
        self.model = staged;
    }

    /// Records the model expects to match `path == value`.
    pub fn expected_matches(&self, path: &str, value: &Value) -> HashMap<String, Value> {
        let path = FieldPath::parse(path).expect("Invalid field path");
        let key = IndexKey::of(value);
        self.model
            .iter()
            .filter(|(_, doc)| path.evaluate(doc).is_some_and(|v| IndexKey::of(v) == key))
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect()
    }

    /// Runs a query and checks it against the model.
    pub fn query_and_verify(&self, path: &str, value: &Value) -> HashMap<String, Value> {
        let actual = self.store.query(path, value).expect("Failed to query");
        assert_eq!(actual, self.expected_matches(path, value), "query {path} mismatch");
        actual
    }

    /// Verifies every tracked record and the record count.
    pub fn verify_all(&self) {
        let merged = self.store.merge().expect("Failed to merge");
        assert_eq!(*merged, self.model, "merged view mismatch");
        assert_eq!(self.store.status().record_count, self.model.len());
    }

    /// Saves, reopens, and verifies the reloaded datastore.
    pub fn reload(self) -> Self {
        let Self { store, model } = self;
        store.save().expect("Failed to save");
        let harness = Self {
            store: store.reopen(),
            model,
        };
        harness.verify_all();
        harness
    }

    /// Returns the count of tracked records.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}
