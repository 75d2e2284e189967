//! Transaction handle.

use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use crate::store::field_matches;
use crate::types::{FieldPath, ShardId, TransactionId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, warn};
use yarndb_codec::{IndexKey, Value};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction was rolled back, explicitly or by being dropped.
    RolledBack,
    /// The lease ran out before the transaction finished.
    Expired,
}

/// A staged change in a transaction's overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Insert or replace a record.
    Put {
        /// The new document.
        document: Value,
        /// Shard the record will be assigned to.
        shard: ShardId,
    },
    /// Delete a record. Deleting a record that does not exist at commit
    /// time is skipped.
    Delete,
}

/// What a commit applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Records inserted or replaced.
    pub puts: usize,
    /// Records deleted.
    pub deletes: usize,
    /// Tombstones for records that did not exist.
    pub skipped: usize,
}

/// The single open transaction.
///
/// Writes are staged in an overlay owned by the handle and reach the
/// datastore only on [`commit`](Transaction::commit). Reads through the
/// handle see the overlay layered over committed state; nobody else sees
/// the overlay.
///
/// Dropping an active transaction rolls it back.
///
/// # Example
///
/// ```rust
/// use yarndb_core::{Datastore, Value};
///
/// let store = Datastore::open_in_memory().unwrap();
/// let mut txn = store.begin_transaction().unwrap();
/// txn.set("u1", Value::map([("dept", "eng")]), "users").unwrap();
///
/// assert!(txn.get("u1").unwrap().is_some());
/// assert!(store.get("u1").unwrap().is_none());
///
/// txn.commit().unwrap();
/// assert!(store.get("u1").unwrap().is_some());
/// ```
pub struct Transaction<'db> {
    shared: &'db Shared,
    id: TransactionId,
    state: TransactionState,
    writes: BTreeMap<String, PendingWrite>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(shared: &'db Shared, id: TransactionId) -> Self {
        Self {
            shared,
            id,
            state: TransactionState::Active,
            writes: BTreeMap::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Returns the staged write for `id`, if any.
    #[must_use]
    pub fn pending(&self, id: &str) -> Option<&PendingWrite> {
        self.writes.get(id)
    }

    /// Returns all staged writes in id order.
    pub fn pending_writes(&self) -> impl Iterator<Item = (&str, &PendingWrite)> {
        self.writes.iter().map(|(id, w)| (id.as_str(), w))
    }

    /// Stages an insert or replace.
    ///
    /// # Errors
    ///
    /// Fails if the transaction is finished, its lease lapsed, or the id is
    /// empty.
    pub fn set(&mut self, id: &str, document: Value, shard_hint: &str) -> CoreResult<()> {
        self.touch()?;
        let shard = self.shared.resolve_shard(id, shard_hint)?;
        self.writes
            .insert(id.to_string(), PendingWrite::Put { document, shard });
        Ok(())
    }

    /// Stages a delete.
    pub fn delete(&mut self, id: &str) -> CoreResult<()> {
        self.touch()?;
        self.writes.insert(id.to_string(), PendingWrite::Delete);
        Ok(())
    }

    /// Reads a record, preferring the staged version.
    pub fn get(&mut self, id: &str) -> CoreResult<Option<Value>> {
        self.touch()?;
        match self.writes.get(id) {
            Some(PendingWrite::Put { document, .. }) => Ok(Some(document.clone())),
            Some(PendingWrite::Delete) => Ok(None),
            None => Ok(self.shared.get(id)),
        }
    }

    /// Runs an exact-match query over committed state with the overlay
    /// applied.
    pub fn query(&mut self, path: &str, value: &Value) -> CoreResult<HashMap<String, Value>> {
        self.touch()?;
        let path = FieldPath::parse(path)?;
        let key = IndexKey::of(value);
        let mut found = self.shared.query(&path, value);

        for (id, write) in &self.writes {
            found.remove(id);
            if let PendingWrite::Put { document, .. } = write {
                if field_matches(&path, document, &key) {
                    found.insert(id.clone(), document.clone());
                }
            }
        }
        Ok(found)
    }

    /// Returns every record as this transaction sees it. Always recomputed.
    pub fn merge(&mut self) -> CoreResult<HashMap<String, Value>> {
        self.touch()?;
        let mut view = self.shared.state.read().records().clone();
        for (id, write) in &self.writes {
            match write {
                PendingWrite::Put { document, .. } => {
                    view.insert(id.clone(), document.clone());
                }
                PendingWrite::Delete => {
                    view.remove(id);
                }
            }
        }
        Ok(view)
    }

    /// Applies every staged write atomically and releases the slot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TransactionExpired`] if the lease lapsed; nothing
    /// is applied in that case.
    pub fn commit(&mut self) -> CoreResult<CommitSummary> {
        self.ensure_active()?;
        self.shared.ensure_open()?;

        let writes = std::mem::take(&mut self.writes);
        let shared = self.shared;
        let outcome = shared.gate.finish(self.id, || {
            let mut state = shared.state.write();
            let mut summary = CommitSummary::default();
            for (id, write) in writes {
                match write {
                    PendingWrite::Put { document, shard } => {
                        state.put(id, document, shard);
                        shared.stats.record_write();
                        summary.puts += 1;
                    }
                    PendingWrite::Delete => {
                        if state.remove(&id).is_some() {
                            shared.stats.record_delete();
                            summary.deletes += 1;
                        } else {
                            summary.skipped += 1;
                        }
                    }
                }
            }
            if summary.puts + summary.deletes > 0 {
                shared.cache.invalidate();
            }
            summary
        });

        match outcome {
            Ok(summary) => {
                self.state = TransactionState::Committed;
                shared.stats.record_transaction_commit();
                info!(
                    txid = %self.id,
                    puts = summary.puts,
                    deletes = summary.deletes,
                    "transaction committed"
                );
                Ok(summary)
            }
            Err(err) => {
                self.lapse();
                Err(err)
            }
        }
    }

    /// Discards the overlay and releases the slot.
    pub fn rollback(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        self.abandon();
        Ok(())
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::RolledBack => Err(CoreError::invalid_operation(
                "transaction already rolled back",
            )),
            TransactionState::Expired => Err(CoreError::TransactionExpired { txid: self.id }),
        }
    }

    /// Checks the transaction is usable and renews its lease.
    fn touch(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        self.shared.ensure_open()?;
        if let Err(err) = self.shared.gate.renew(self.id) {
            self.lapse();
            return Err(err);
        }
        Ok(())
    }

    fn lapse(&mut self) {
        warn!(txid = %self.id, "transaction lease expired");
        self.writes.clear();
        self.state = TransactionState::Expired;
        self.shared.stats.record_transaction_expired();
    }

    fn abandon(&mut self) {
        self.writes.clear();
        if self.shared.gate.release(self.id) {
            self.state = TransactionState::RolledBack;
            self.shared.stats.record_transaction_rollback();
            info!(txid = %self.id, "transaction rolled back");
        } else {
            self.lapse();
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.is_active() {
            debug!(txid = %self.id, staged = self.writes.len(), "dropping active transaction");
            self.abandon();
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("writes", &self.writes.len())
            .finish()
    }
}
