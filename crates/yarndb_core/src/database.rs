//! Datastore facade.

use crate::autosave::AutoSaver;
use crate::cache::{MergeCache, MergedView};
use crate::config::Config;
use crate::dir::DataDir;
use crate::error::{CoreError, CoreResult};
use crate::loader::{self, LoadReport};
use crate::persist::SaveReport;
use crate::stats::{DatastoreStats, StatsSnapshot};
use crate::store::{QueryRoute, StoreState};
use crate::transaction::{Transaction, TransactionGate};
use crate::types::{FieldPath, ShardId, TransactionId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use yarndb_codec::Value;
use yarndb_storage::{FileBackend, InMemoryBackend, ShardBackend};

/// State shared between the datastore, its transactions and the autosave
/// thread.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) default_shard: ShardId,
    pub(crate) backend: Arc<dyn ShardBackend>,
    pub(crate) state: RwLock<StoreState>,
    pub(crate) cache: MergeCache,
    pub(crate) gate: TransactionGate,
    pub(crate) save_lock: Mutex<()>,
    pub(crate) stats: DatastoreStats,
    next_txid: AtomicU64,
    is_open: AtomicBool,
}

impl Shared {
    pub(crate) fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CoreError::Closed)
        }
    }

    /// Picks the shard for a record: the hint if it is usable, the id
    /// prefix if no hint was given, the default shard otherwise.
    pub(crate) fn resolve_shard(&self, id: &str, hint: &str) -> CoreResult<ShardId> {
        if id.is_empty() {
            return Err(CoreError::invalid_id(id, "id is empty"));
        }
        let shard = if hint.is_empty() {
            ShardId::for_record(id)
        } else {
            ShardId::parse(hint)
        };
        Ok(shard.unwrap_or_else(|| {
            debug!(id, hint, default = %self.default_shard, "using default shard");
            self.default_shard.clone()
        }))
    }

    pub(crate) fn get(&self, id: &str) -> Option<Value> {
        self.stats.record_read();
        self.state.read().get(id).cloned()
    }

    pub(crate) fn query(&self, path: &FieldPath, value: &Value) -> HashMap<String, Value> {
        let (found, route) = self.state.read().query(path, value);
        match route {
            QueryRoute::Index => self.stats.record_index_lookup(),
            QueryRoute::Scan => self.stats.record_scan(),
        }
        found
    }
}

/// A summary of datastore state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Number of records.
    pub record_count: usize,
    /// Number of shards currently holding records.
    pub shard_count: usize,
    /// Indexed field paths, sorted.
    pub index_paths: Vec<String>,
    /// Whether there are changes not yet saved.
    pub dirty: bool,
    /// Whether a transaction holds a live lease.
    pub transaction_active: bool,
    /// The data directory, for datastores opened from a path.
    pub data_dir: Option<PathBuf>,
    /// Background save period (zero when disabled).
    pub auto_save_interval: Duration,
}

/// The main datastore handle.
///
/// `Datastore` is the entry point for YarnDB. It provides:
/// - Record reads and writes (`set`, `get`, `delete`)
/// - Exact-match queries, optionally backed by field indexes
/// - A single-writer staged [`Transaction`]
/// - Saving to YAML shard files, on demand and periodically
///
/// All methods take `&self`; the datastore can be shared across threads.
///
/// # Example
///
/// ```rust
/// use yarndb_core::{Datastore, Value};
///
/// let store = Datastore::open_in_memory().unwrap();
/// store.set("u1", Value::map([("name", "Ann"), ("dept", "eng")]), "users").unwrap();
/// store.set("u2", Value::map([("name", "Bo"), ("dept", "ops")]), "users").unwrap();
///
/// let eng = store.query("dept", &Value::from("eng")).unwrap();
/// assert_eq!(eng.len(), 1);
/// assert!(eng.contains_key("u1"));
/// ```
pub struct Datastore {
    shared: Arc<Shared>,
    autosaver: Mutex<Option<AutoSaver>>,
    load_report: LoadReport,
    /// Holds the directory lock. None for datastores without a directory.
    dir: Option<DataDir>,
}

impl Datastore {
    /// Opens a datastore from a data directory with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process has the directory locked (`DatabaseLocked`)
    /// - The directory cannot be listed
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a datastore from a data directory.
    ///
    /// Every `records_*.yaml` file in the directory is loaded. Files that
    /// fail to load are skipped and listed in [`Datastore::load_report`].
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use std::time::Duration;
    /// use yarndb_core::{Config, Datastore};
    ///
    /// let config = Config::new()
    ///     .auto_save_interval(Duration::from_secs(10))
    ///     .index("dept");
    /// let store = Datastore::open_with_config(Path::new("data"), config)?;
    /// # Ok::<(), yarndb_core::CoreError>(())
    /// ```
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let dir = DataDir::open(path, config.create_if_missing)?;
        let backend = FileBackend::open(dir.path())?;
        Self::build(config, Arc::new(backend), Some(dir))
    }

    /// Opens a datastore over an existing backend.
    ///
    /// This is a lower-level constructor for when you have a pre-configured
    /// backend. No directory lock is taken.
    pub fn open_with_backend(config: Config, backend: Arc<dyn ShardBackend>) -> CoreResult<Self> {
        Self::build(config, backend, None)
    }

    /// Opens an empty in-memory datastore for testing.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with_config(Config::default())
    }

    /// Opens an empty in-memory datastore with custom configuration.
    pub fn open_in_memory_with_config(config: Config) -> CoreResult<Self> {
        Self::build(config, Arc::new(InMemoryBackend::new()), None)
    }

    fn build(
        config: Config,
        backend: Arc<dyn ShardBackend>,
        dir: Option<DataDir>,
    ) -> CoreResult<Self> {
        let default_shard = config.validate()?;

        let state = RwLock::new(StoreState::new());
        let load_report = loader::load_all(backend.as_ref(), &state)?;

        {
            let mut state = state.write();
            for raw in &config.indexes {
                let path = FieldPath::parse(raw)?;
                if state.indexes().contains(&path) {
                    continue;
                }
                let entered = state.create_index(path)?;
                debug!(path = %raw, records = entered, "built configured index");
            }
        }

        let interval = config.auto_save_interval;
        let shared = Arc::new(Shared {
            gate: TransactionGate::new(config.transaction_lease),
            config,
            default_shard,
            backend,
            state,
            cache: MergeCache::new(),
            save_lock: Mutex::new(()),
            stats: DatastoreStats::new(),
            next_txid: AtomicU64::new(1),
            is_open: AtomicBool::new(true),
        });

        let autosaver = if interval.is_zero() {
            None
        } else {
            Some(AutoSaver::spawn(Arc::downgrade(&shared), interval)?)
        };

        let store = Self {
            shared,
            autosaver: Mutex::new(autosaver),
            load_report,
            dir,
        };
        info!(
            records = store.shared.state.read().len(),
            failed_files = store.load_report.failures.len(),
            dir = ?store.data_dir(),
            "datastore opened"
        );
        Ok(store)
    }

    /// Inserts or replaces a record.
    ///
    /// `shard_hint` names the shard the record is saved to. An empty hint
    /// uses the id prefix (`users_17` goes to `users`); a hint that cannot be
    /// part of a file name uses the default shard.
    pub fn set(&self, id: &str, document: Value, shard_hint: &str) -> CoreResult<()> {
        self.shared.ensure_open()?;
        let shard = self.shared.resolve_shard(id, shard_hint)?;

        let mut state = self.shared.state.write();
        state.put(id.to_string(), document, shard);
        self.shared.cache.invalidate();
        self.shared.stats.record_write();
        Ok(())
    }

    /// Reads a record. `None` means no record has this id.
    pub fn get(&self, id: &str) -> CoreResult<Option<Value>> {
        self.shared.ensure_open()?;
        Ok(self.shared.get(id))
    }

    /// Returns true if a record has this id.
    pub fn contains(&self, id: &str) -> CoreResult<bool> {
        self.shared.ensure_open()?;
        Ok(self.shared.state.read().contains(id))
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no record has this id.
    pub fn delete(&self, id: &str) -> CoreResult<()> {
        self.shared.ensure_open()?;

        let mut state = self.shared.state.write();
        state.remove(id).ok_or_else(|| CoreError::not_found(id))?;
        self.shared.cache.invalidate();
        self.shared.stats.record_delete();
        Ok(())
    }

    /// Creates an index on a dotted field path, built from every current
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexExists`] if the path is already indexed and
    /// [`CoreError::InvalidPath`] if the path is malformed.
    pub fn create_index(&self, path: &str) -> CoreResult<()> {
        self.shared.ensure_open()?;
        let path = FieldPath::parse(path)?;

        let mut state = self.shared.state.write();
        let entered = state.create_index(path.clone())?;
        info!(path = %path, records = entered, "index created");
        Ok(())
    }

    /// Returns the record that most recently wrote `value` at an indexed
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the path is not indexed.
    pub fn index_lookup(&self, path: &str, value: &Value) -> CoreResult<Option<String>> {
        self.shared.ensure_open()?;
        let path = FieldPath::parse(path)?;

        let state = self.shared.state.read();
        let index = state
            .indexes()
            .get(&path)
            .ok_or_else(|| CoreError::invalid_operation(format!("no index on {path}")))?;
        self.shared.stats.record_index_lookup();
        Ok(index.last_holder(value).map(str::to_string))
    }

    /// Returns every record whose value at `path` equals `value`.
    ///
    /// Uses the index on `path` when there is one and scans otherwise; the
    /// result is the same either way. Values match by type as well as
    /// content, so `1` does not match `1.0`.
    pub fn query(&self, path: &str, value: &Value) -> CoreResult<HashMap<String, Value>> {
        self.shared.ensure_open()?;
        let path = FieldPath::parse(path)?;
        Ok(self.shared.query(&path, value))
    }

    /// Returns every committed record.
    ///
    /// The view is cached until the next change, so repeated calls are
    /// cheap.
    pub fn merge(&self) -> CoreResult<MergedView> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read();
        Ok(self
            .shared
            .cache
            .get_or_build(|| state.records().clone()))
    }

    /// Starts the single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TransactionActive`] while another transaction
    /// holds a live lease. A transaction whose lease lapsed is displaced.
    pub fn begin_transaction(&self) -> CoreResult<Transaction<'_>> {
        self.shared.ensure_open()?;
        let txid = TransactionId::new(self.shared.next_txid.fetch_add(1, Ordering::Relaxed));
        if let Some(expired) = self.shared.gate.acquire(txid)? {
            warn!(expired = %expired, txid = %txid, "reclaimed expired transaction lease");
        }
        self.shared.stats.record_transaction_start();
        info!(txid = %txid, "transaction started");
        Ok(Transaction::new(&self.shared, txid))
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is rolled back.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> CoreResult<T>,
    {
        let mut txn = self.begin_transaction()?;
        match f(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if txn.is_active() {
                    txn.rollback()?;
                }
                Err(err)
            }
        }
    }

    /// Writes every shard if anything changed since the last save.
    ///
    /// # Errors
    ///
    /// Returns the first failed write. Shards written before it keep their
    /// new contents and the datastore stays dirty.
    pub fn save(&self) -> CoreResult<SaveReport> {
        self.shared.ensure_open()?;
        self.shared.save()
    }

    /// Returns a summary of the current state.
    #[must_use]
    pub fn status(&self) -> Status {
        // Gate before data, the order commit takes them in.
        let transaction_active = self.shared.gate.is_held();
        let state = self.shared.state.read();
        Status {
            record_count: state.len(),
            shard_count: state.shard_count(),
            index_paths: state.indexes().paths(),
            dirty: state.is_dirty(),
            transaction_active,
            data_dir: self.data_dir().map(Path::to_path_buf),
            auto_save_interval: self.shared.config.auto_save_interval,
        }
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns what happened while loading at open.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the data directory, for datastores opened from a path.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(DataDir::path)
    }

    /// Stops background saves, saves one last time and closes the
    /// datastore. Later operations fail with [`CoreError::Closed`].
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the final save's error. The datastore is closed regardless.
    pub fn close(&self) -> CoreResult<()> {
        if self
            .shared
            .is_open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        if let Some(saver) = self.autosaver.lock().take() {
            saver.stop();
        }
        let saved = self.shared.save();
        info!("datastore closed");
        saved.map(|_| ())
    }

    /// Checks if the datastore is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.is_open.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("is_open", &self.is_open())
            .field("data_dir", &self.data_dir())
            .field("records", &self.shared.state.read().len())
            .finish_non_exhaustive()
    }
}

impl Drop for Datastore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "final save on drop failed");
        }
    }
}
