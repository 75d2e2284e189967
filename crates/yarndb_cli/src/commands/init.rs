//! Init command implementation.

use super::{with_store, CommandResult};
use crate::settings::Settings;
use tracing::info;

/// Runs the init command: creates the data directory and reports what is
/// already in it.
pub fn run(settings: &Settings) -> CommandResult {
    with_store(settings, |store| {
        let report = store.load_report();
        info!(data_dir = %settings.data_dir.display(), "datastore initialized");
        println!("YarnDB initialized in {}", settings.data_dir.display());
        println!(
            "Loaded {} records from {} of {} shard files",
            report.records_loaded, report.files_loaded, report.files_scanned
        );
        for failure in &report.failures {
            println!("  skipped {}: {}", failure.file, failure.error);
        }
        Ok(())
    })
}
