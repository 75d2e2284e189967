//! Transactions.
//!
//! YarnDB allows one open transaction at a time. A transaction stages
//! writes in its own overlay and applies them in one step on commit:
//! - Other readers never see staged writes
//! - Commit maintains indexes exactly like direct writes do
//! - Every transaction holds a lease on the single slot; an idle holder
//!   whose lease lapsed is displaced by the next `begin_transaction`

mod handle;
mod lease;

pub use handle::{CommitSummary, PendingWrite, Transaction, TransactionState};
pub(crate) use lease::TransactionGate;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::Datastore;
    use crate::error::CoreError;
    use std::thread;
    use std::time::Duration;
    use yarndb_codec::Value;

    fn store() -> Datastore {
        Datastore::open_in_memory().unwrap()
    }

    fn user(name: &str, dept: &str) -> Value {
        Value::map([("name", name), ("dept", dept)])
    }

    #[test]
    fn one_transaction_at_a_time() {
        let store = store();
        let mut first = store.begin_transaction().unwrap();
        assert!(matches!(
            store.begin_transaction(),
            Err(CoreError::TransactionActive)
        ));

        first.commit().unwrap();
        let mut second = store.begin_transaction().unwrap();
        second.rollback().unwrap();
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn read_your_writes() {
        let store = store();
        store.set("u1", user("Ann", "eng"), "users").unwrap();

        let mut txn = store.begin_transaction().unwrap();
        txn.set("u1", user("Ann", "ops"), "users").unwrap();
        txn.set("u2", user("Bo", "ops"), "users").unwrap();
        txn.delete("u3").unwrap();

        assert_eq!(txn.get("u1").unwrap(), Some(user("Ann", "ops")));
        assert_eq!(txn.get("u3").unwrap(), None);
        assert_eq!(store.get("u1").unwrap(), Some(user("Ann", "eng")));
        assert_eq!(store.get("u2").unwrap(), None);
        assert_eq!(txn.len(), 3);
    }

    #[test]
    fn rollback_leaves_committed_state_untouched() {
        let store = store();
        store.set("u1", user("Ann", "eng"), "users").unwrap();
        store.save().unwrap();

        let mut txn = store.begin_transaction().unwrap();
        txn.set("u1", user("Ann", "hr"), "users").unwrap();
        txn.delete("u1").unwrap();
        txn.rollback().unwrap();

        assert_eq!(store.get("u1").unwrap(), Some(user("Ann", "eng")));
        assert!(!store.status().dirty);
        assert_eq!(txn.state(), TransactionState::RolledBack);
    }

    #[test]
    fn commit_applies_and_maintains_indexes() {
        let store = store();
        store.create_index("dept").unwrap();
        store.set("u1", user("Ann", "eng"), "users").unwrap();

        let mut txn = store.begin_transaction().unwrap();
        txn.set("u2", user("Bo", "eng"), "users").unwrap();
        txn.delete("u1").unwrap();
        txn.delete("ghost").unwrap();
        let summary = txn.commit().unwrap();

        assert_eq!(
            summary,
            CommitSummary {
                puts: 1,
                deletes: 1,
                skipped: 1
            }
        );
        let eng = store.query("dept", &Value::from("eng")).unwrap();
        assert_eq!(eng.keys().collect::<Vec<_>>(), ["u2"]);
        assert!(store.status().dirty);
    }

    #[test]
    fn query_and_merge_layer_the_overlay() {
        let store = store();
        store.set("u1", user("Ann", "eng"), "users").unwrap();
        store.set("u2", user("Bo", "eng"), "users").unwrap();

        let mut txn = store.begin_transaction().unwrap();
        txn.set("u1", user("Ann", "ops"), "users").unwrap();
        txn.set("u3", user("Cy", "eng"), "users").unwrap();

        let eng = txn.query("dept", &Value::from("eng")).unwrap();
        let mut ids: Vec<_> = eng.keys().cloned().collect();
        ids.sort();
        assert_eq!(ids, ["u2", "u3"]);

        let merged = txn.merge().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["u1"], user("Ann", "ops"));
        assert_eq!(store.merge().unwrap().len(), 2);
    }

    #[test]
    fn finished_transaction_rejects_operations() {
        let store = store();
        let mut txn = store.begin_transaction().unwrap();
        txn.commit().unwrap();
        assert!(matches!(
            txn.set("u1", Value::Null, ""),
            Err(CoreError::InvalidOperation { .. })
        ));
        assert!(txn.commit().is_err());
        assert!(txn.rollback().is_err());
    }

    #[test]
    fn dropped_transaction_releases_the_slot() {
        let store = store();
        {
            let mut txn = store.begin_transaction().unwrap();
            txn.set("u1", Value::Null, "").unwrap();
        }
        assert_eq!(store.stats().transactions_rolled_back, 1);
        assert_eq!(store.get("u1").unwrap(), None);
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn abandoned_transaction_is_reclaimed() {
        let lease = Duration::from_millis(40);
        let store = Datastore::open_in_memory_with_config(
            Config::new().transaction_lease(lease),
        )
        .unwrap();

        let mut stale = store.begin_transaction().unwrap();
        stale.set("u1", user("Ann", "eng"), "users").unwrap();
        thread::sleep(lease * 3);

        let mut fresh = store.begin_transaction().unwrap();
        fresh.set("u2", user("Bo", "ops"), "users").unwrap();

        assert!(matches!(
            stale.commit(),
            Err(CoreError::TransactionExpired { .. })
        ));
        assert_eq!(stale.state(), TransactionState::Expired);

        fresh.commit().unwrap();
        assert_eq!(store.get("u1").unwrap(), None);
        assert!(store.get("u2").unwrap().is_some());
        assert_eq!(store.stats().transactions_expired, 1);
    }

    #[test]
    fn idle_lease_expires_without_contender() {
        let lease = Duration::from_millis(40);
        let store = Datastore::open_in_memory_with_config(
            Config::new().transaction_lease(lease),
        )
        .unwrap();

        let mut txn = store.begin_transaction().unwrap();
        txn.set("u1", Value::from(1), "").unwrap();
        thread::sleep(lease * 3);

        assert!(matches!(
            txn.set("u2", Value::from(2), ""),
            Err(CoreError::TransactionExpired { .. })
        ));
        assert!(!store.status().transaction_active);
        assert!(store.begin_transaction().is_ok());
    }
}
