//! In-memory record state.
//!
//! [`StoreState`] is the aggregate guarded by the datastore's data lock:
//! records, their shard assignments, the indexes and the dirty flag. Every
//! mutation of one goes through the same method as the others, so indexes
//! never drift from the records they describe.

mod state;

pub(crate) use state::{QueryRoute, StoreState};

use crate::types::FieldPath;
use yarndb_codec::{IndexKey, Value};

/// Returns true if `document` holds a value equal to `key` at `path`.
///
/// Equality is [`IndexKey`] equality, the same one indexes use.
pub(crate) fn field_matches(path: &FieldPath, document: &Value, key: &IndexKey) -> bool {
    path.evaluate(document)
        .is_some_and(|found| IndexKey::of(found) == *key)
}
