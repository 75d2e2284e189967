//! Property-based test generators.
//!
//! Provides proptest strategies for generating test data.

use proptest::prelude::*;
use yarndb_core::Value;

/// Shard prefixes that generated ids are drawn from.
pub const SHARD_PREFIXES: [&str; 4] = ["users", "orders", "items", "misc"];

/// Strategy for record ids of the form `<prefix>_<n>`.
///
/// Ids are drawn from a small space so sequences revisit records.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    (prop::sample::select(SHARD_PREFIXES.to_vec()), 0u32..32)
        .prop_map(|(prefix, n)| format!("{prefix}_{n}"))
}

/// Strategy for shard hints, including invalid ones that fall back to the
/// default shard.
pub fn shard_hint_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => Just(String::new()),
        2 => "[a-z]{1,8}",
        1 => Just("bad/hint".to_string()),
    ]
}

/// Strategy for scalar values that survive a YAML round trip.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        (-1000i32..1000).prop_map(|n| Value::from(f64::from(n) + 0.5)),
        // Leading `s` keeps clear of YAML keywords such as `null` or `yes`.
        "s[a-z]{0,7}".prop_map(Value::from),
    ]
}

/// Strategy for field values shared across documents so queries hit.
pub fn field_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(vec!["eng", "ops", "sales"]).prop_map(Value::from),
        (0i64..4).prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Strategy for documents carrying `dept` and `address.city` fields, some of
/// them missing.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of(field_value_strategy()),
        prop::option::of(field_value_strategy()),
        scalar_strategy(),
    )
        .prop_map(|(dept, city, extra)| {
            let mut pairs = vec![("extra".to_string(), extra)];
            if let Some(dept) = dept {
                pairs.push(("dept".to_string(), dept));
            }
            if let Some(city) = city {
                pairs.push(("address".to_string(), Value::map([("city", city)])));
            }
            Value::map(pairs)
        })
}

/// Operations for stateful testing.
#[derive(Debug, Clone)]
pub enum RecordOperation {
    /// Insert or replace a record.
    Set {
        /// Record id.
        id: String,
        /// Document.
        document: Value,
        /// Shard hint.
        hint: String,
    },
    /// Delete a record.
    Delete {
        /// Record id.
        id: String,
    },
    /// Read a record.
    Get {
        /// Record id.
        id: String,
    },
}

/// Strategy for a single operation.
pub fn operation_strategy() -> impl Strategy<Value = RecordOperation> {
    prop_oneof![
        5 => (record_id_strategy(), document_strategy(), shard_hint_strategy())
            .prop_map(|(id, document, hint)| RecordOperation::Set { id, document, hint }),
        2 => record_id_strategy().prop_map(|id| RecordOperation::Delete { id }),
        2 => record_id_strategy().prop_map(|id| RecordOperation::Get { id }),
    ]
}

/// Strategy for a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<RecordOperation>> {
    prop::collection::vec(operation_strategy(), min_ops..=max_ops)
}

/// Property test configuration.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a quick config for CI.
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a thorough config for release testing.
    pub fn thorough() -> Self {
        Self {
            cases: 1000,
            max_shrink_iters: 5000,
        }
    }

    /// Converts to proptest config.
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yarndb_core::ShardId;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn record_ids_name_a_valid_shard(id in record_id_strategy()) {
            let shard = ShardId::for_record(&id).unwrap();
            prop_assert!(SHARD_PREFIXES.contains(&shard.as_str()));
        }

        #[test]
        fn documents_are_maps(doc in document_strategy()) {
            prop_assert!(doc.as_map().is_some());
            prop_assert!(doc.get("extra").is_some());
        }

        #[test]
        fn sequences_respect_bounds(ops in operation_sequence_strategy(3, 7)) {
            prop_assert!((3..=7).contains(&ops.len()));
        }
    }
}
