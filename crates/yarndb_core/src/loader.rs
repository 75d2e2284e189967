//! Startup loading of shard files.
//!
//! All shard files are read and decoded in parallel, one scoped thread per
//! file. Decoded shards are then merged into the store one at a time, in
//! ascending file name order, so when two files hold the same record id the
//! file that sorts last wins.

use crate::error::{CoreError, CoreResult};
use crate::store::StoreState;
use crate::types::ShardId;
use parking_lot::RwLock;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use yarndb_codec::{decode_shard, ShardRecords};
use yarndb_storage::ShardBackend;

/// A shard file that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    /// File name of the shard.
    pub file: String,
    /// Why it failed.
    pub error: CoreError,
}

/// Outcome of loading a data directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Shard files found.
    pub files_scanned: usize,
    /// Shard files merged into the store.
    pub files_loaded: usize,
    /// Records merged, counting records later replaced by a duplicate id.
    pub records_loaded: usize,
    /// Files skipped because they could not be read or decoded.
    pub failures: Vec<LoadFailure>,
    /// Wall time spent loading.
    pub elapsed: Duration,
}

impl LoadReport {
    /// Returns true if every shard file loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads every shard file the backend holds into `state`.
///
/// Individual file failures are collected in the report. Only a failure to
/// list the backend fails the whole load.
pub(crate) fn load_all(
    backend: &dyn ShardBackend,
    state: &RwLock<StoreState>,
) -> CoreResult<LoadReport> {
    let started = Instant::now();
    let mut files: Vec<(String, ShardId)> = backend
        .list()?
        .into_iter()
        .filter_map(|name| ShardId::from_file_name(&name).map(|shard| (name, shard)))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let decoded: Vec<(String, ShardId, CoreResult<ShardRecords>)> = thread::scope(|scope| {
        let workers: Vec<_> = files
            .into_iter()
            .map(|(name, shard)| {
                let worker = scope.spawn({
                    let name = name.clone();
                    move || read_shard(backend, &name)
                });
                (name, shard, worker)
            })
            .collect();

        workers
            .into_iter()
            .map(|(name, shard, worker)| {
                let result = worker.join().unwrap_or_else(|_| {
                    Err(CoreError::invalid_operation(format!(
                        "loader thread for {name} panicked"
                    )))
                });
                (name, shard, result)
            })
            .collect()
    });

    let mut report = LoadReport {
        files_scanned: decoded.len(),
        ..LoadReport::default()
    };

    for (name, shard, result) in decoded {
        match result {
            Ok(records) => {
                let loaded = state.write().load_shard(&shard, records);
                debug!(file = %name, records = loaded, "loaded shard");
                report.files_loaded += 1;
                report.records_loaded += loaded;
            }
            Err(error) => {
                warn!(file = %name, %error, "skipping shard that failed to load");
                report.failures.push(LoadFailure { file: name, error });
            }
        }
    }

    report.elapsed = started.elapsed();
    info!(
        files = report.files_loaded,
        failed = report.failures.len(),
        records = report.records_loaded,
        elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "load complete"
    );
    Ok(report)
}

fn read_shard(backend: &dyn ShardBackend, name: &str) -> CoreResult<ShardRecords> {
    let bytes = backend.read(name)?;
    decode_shard(&bytes).map_err(|source| CoreError::codec(name, source))
}
