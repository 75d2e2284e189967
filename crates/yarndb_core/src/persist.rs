//! Flushing records to shard files.

use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLockUpgradableReadGuard;
use tracing::{debug, error, info};
use yarndb_codec::encode_shard;

/// What a save did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Shard files written.
    pub shards_written: usize,
    /// Shard files removed because they no longer held any record.
    pub shards_removed: usize,
    /// Records written.
    pub records: usize,
}

impl SaveReport {
    /// Returns true if the save found nothing to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.shards_written == 0 && self.shards_removed == 0
    }
}

impl Shared {
    /// Writes every shard if the store is dirty.
    ///
    /// Saves are serialized by the save lock. The data lock is held in
    /// upgradable mode throughout: readers proceed, writers wait, and the
    /// dirty flag is cleared by upgrading once every file is written.
    ///
    /// A failed write stops the save. Shards written before it keep their
    /// new contents and the store stays dirty, so the next save retries.
    pub(crate) fn save(&self) -> CoreResult<SaveReport> {
        let _serial = self.save_lock.lock();
        let state = self.state.upgradable_read();
        if !state.is_dirty() {
            debug!("save skipped, nothing changed");
            return Ok(SaveReport::default());
        }

        let plan = state.flush_plan(&self.default_shard);
        let mut report = SaveReport::default();
        let mut written = Vec::with_capacity(plan.groups.len());
        let mut removed = Vec::with_capacity(plan.stale.len());

        let outcome = (|| -> CoreResult<()> {
            for (shard, records) in &plan.groups {
                let file = shard.file_name();
                let bytes =
                    encode_shard(records).map_err(|source| CoreError::codec(&file, source))?;
                self.backend.write(&file, &bytes)?;
                self.stats.record_shard_write();
                debug!(file = %file, records = records.len(), "wrote shard");
                written.push(shard.clone());
                report.shards_written += 1;
                report.records += records.len();
            }
            for shard in &plan.stale {
                let file = shard.file_name();
                self.backend.remove(&file)?;
                debug!(file = %file, "removed empty shard");
                removed.push(shard.clone());
                report.shards_removed += 1;
            }
            Ok(())
        })();

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        for shard in written {
            state.mark_persisted(shard);
        }
        for shard in &removed {
            state.forget_persisted(shard);
        }

        match outcome {
            Ok(()) => {
                state.mark_clean();
                self.stats.record_save();
                info!(
                    shards = report.shards_written,
                    removed = report.shards_removed,
                    records = report.records,
                    "save complete"
                );
                Ok(report)
            }
            Err(err) => {
                self.stats.record_error();
                error!(
                    error = %err,
                    written = report.shards_written,
                    "save failed, store stays dirty"
                );
                Err(err)
            }
        }
    }
}
