//! Save command implementation.

use super::{with_store, CommandResult};
use crate::settings::Settings;

/// Runs the save command.
///
/// Loading never dirties the store, so this rewrites nothing unless an
/// earlier run left changes behind.
pub fn run(settings: &Settings) -> CommandResult {
    with_store(settings, |store| {
        let report = store.save()?;
        if report.is_noop() {
            println!("Nothing to save");
        } else {
            println!(
                "Saved {} records to {} shards ({} removed)",
                report.records, report.shards_written, report.shards_removed
            );
        }
        Ok(())
    })
}
