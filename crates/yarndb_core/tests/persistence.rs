//! Save and reload against real shard files and fault-injecting backends.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use yarndb_core::{Config, CoreError, Datastore, ErrorKind, Value};
use yarndb_storage::{InMemoryBackend, ShardBackend};

fn quiet() -> Config {
    Config::new().auto_save_interval(Duration::ZERO)
}

fn user(name: &str, dept: &str) -> Value {
    Value::map([("name", name), ("dept", dept)])
}

fn probed() -> (Datastore, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let store = Datastore::open_with_backend(quiet(), backend.clone()).unwrap();
    (store, backend)
}

#[test]
fn save_then_reopen_round_trips() {
    let dir = tempdir().unwrap();
    let nested = Value::map([
        ("name", Value::from("Ann")),
        ("scores", Value::from(vec![1.5, 2.0])),
        ("address", Value::map([("city", "Oslo"), ("zip", "0150")])),
        ("manager", Value::Null),
        ("active", Value::from(true)),
    ]);

    let expected: HashMap<String, Value> = {
        let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
        store.set("users_1", nested.clone(), "").unwrap();
        store.set("users_2", user("Bo", "ops"), "").unwrap();
        store.set("o1", Value::map([("total", 42)]), "orders").unwrap();
        store.save().unwrap();
        let merged = store.merge().unwrap();
        (*merged).clone()
    };

    assert!(dir.path().join("records_users.yaml").exists());
    assert!(dir.path().join("records_orders.yaml").exists());

    let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    assert_eq!(*store.merge().unwrap(), expected);
    assert!(store.load_report().is_complete());
    assert!(!store.status().dirty);
}

#[test]
fn close_performs_final_save() {
    let dir = tempdir().unwrap();
    {
        let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
        store.set("u1", user("Ann", "eng"), "users").unwrap();
        store.close().unwrap();
    }
    let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    assert_eq!(store.get("u1").unwrap(), Some(user("Ann", "eng")));
}

#[test]
fn drop_saves_too() {
    let dir = tempdir().unwrap();
    {
        let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
        store.set("u1", Value::from(1), "users").unwrap();
    }
    let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    assert_eq!(store.get("u1").unwrap(), Some(Value::from(1)));
}

#[test]
fn directory_is_locked_while_open() {
    let dir = tempdir().unwrap();
    let _store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    let err = Datastore::open_with_config(dir.path(), quiet()).unwrap_err();
    assert!(matches!(err, CoreError::DatabaseLocked));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn clean_save_writes_nothing() {
    let (store, backend) = probed();
    let report = store.save().unwrap();
    assert!(report.is_noop());
    assert_eq!(backend.write_count(), 0);

    store.set("u1", user("Ann", "eng"), "users").unwrap();
    store.save().unwrap();
    let after_first = backend.write_count();
    assert_eq!(after_first, 1);

    store.save().unwrap();
    assert_eq!(backend.write_count(), after_first);
}

#[test]
fn each_non_empty_shard_is_written_once() {
    let (store, backend) = probed();
    store.set("u1", Value::Null, "users").unwrap();
    store.set("u2", Value::Null, "users").unwrap();
    store.set("o1", Value::Null, "orders").unwrap();
    store.set("x", Value::Null, "bad/hint").unwrap();

    let report = store.save().unwrap();
    assert_eq!(report.shards_written, 3);
    assert_eq!(report.records, 4);
    assert_eq!(
        backend.list().unwrap(),
        [
            "records_default.yaml",
            "records_orders.yaml",
            "records_users.yaml"
        ]
    );
    assert_eq!(store.stats().shard_writes, 3);
}

#[test]
fn failed_write_leaves_store_dirty() {
    let (store, backend) = probed();
    store.set("a_1", Value::from(1), "").unwrap();
    store.set("b_1", Value::from(2), "").unwrap();
    store.set("c_1", Value::from(3), "").unwrap();

    backend.fail_writes_to("records_b.yaml");
    let err = store.save().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(store.status().dirty);

    // Shards before the failure keep their new contents.
    assert!(backend.contents("records_a.yaml").is_some());
    assert!(backend.contents("records_c.yaml").is_none());
    assert_eq!(store.stats().errors, 1);

    backend.clear_faults();
    store.save().unwrap();
    assert!(!store.status().dirty);
    assert!(backend.contents("records_c.yaml").is_some());
}

#[test]
fn emptied_shard_is_removed() {
    let dir = tempdir().unwrap();
    {
        let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
        store.set("u1", Value::Null, "users").unwrap();
        store.set("o1", Value::Null, "orders").unwrap();
        store.save().unwrap();
        store.delete("o1").unwrap();
        let report = store.save().unwrap();
        assert_eq!(report.shards_removed, 1);
    }
    assert!(!dir.path().join("records_orders.yaml").exists());

    let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    assert_eq!(store.get("o1").unwrap(), None);
    assert_eq!(store.status().record_count, 1);
}

#[test]
fn duplicate_ids_resolve_by_file_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("records_alpha.yaml"), "dup: {from: alpha}\n").unwrap();
    fs::write(dir.path().join("records_beta.yaml"), "dup: {from: beta}\n").unwrap();

    for _ in 0..3 {
        let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
        assert_eq!(
            store.get("dup").unwrap(),
            Some(Value::map([("from", "beta")]))
        );
    }
}

#[test]
fn corrupt_file_does_not_block_startup() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("records_good.yaml"), "g1: {ok: true}\n").unwrap();
    fs::write(dir.path().join("records_bad.yaml"), "b1: {unclosed\n").unwrap();
    fs::write(dir.path().join("README.txt"), "ignored").unwrap();

    let store = Datastore::open_with_config(dir.path(), quiet()).unwrap();
    let report = store.load_report();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "records_bad.yaml");
    assert!(store.get("g1").unwrap().is_some());
}

#[test]
fn autosave_flushes_in_background() {
    let (backend, store) = {
        let backend = Arc::new(InMemoryBackend::new());
        let config = Config::new().auto_save_interval(Duration::from_millis(20));
        let store = Datastore::open_with_backend(config, backend.clone()).unwrap();
        (backend, store)
    };
    store.set("u1", Value::from(1), "users").unwrap();

    let mut saved = false;
    for _ in 0..100 {
        if !store.status().dirty {
            saved = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(saved);
    assert!(backend.contents("records_users.yaml").is_some());
    store.close().unwrap();
}

#[test]
fn concurrent_readers_see_completed_writes() {
    let store = Arc::new(Datastore::open_in_memory_with_config(quiet()).unwrap());
    for i in 0..100 {
        store.set(&format!("u{i}"), Value::from(i), "users").unwrap();
    }

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    let got = store.get(&format!("u{i}")).unwrap();
                    assert_eq!(got, Some(Value::from(i)));
                }
            })
        })
        .collect();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.stats().reads, 800);
}

#[test]
fn status_and_commit_run_concurrently() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    let store = Arc::new(Datastore::open_in_memory_with_config(quiet()).unwrap());
    let stop = Arc::new(AtomicBool::new(false));
    let (done_tx, done_rx) = mpsc::channel();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let _ = store.status();
                }
            })
        })
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..2_000 {
                let mut txn = store.begin_transaction().unwrap();
                txn.set(&format!("u{i}"), Value::from(i), "users").unwrap();
                txn.commit().unwrap();
            }
            done_tx.send(()).unwrap();
        })
    };

    let finished = done_rx.recv_timeout(Duration::from_secs(30)).is_ok();
    stop.store(true, Ordering::Relaxed);
    assert!(finished, "commits stalled while status was polled");

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.status().record_count, 2_000);
    assert!(!store.status().transaction_active);
}
