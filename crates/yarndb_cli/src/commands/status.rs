//! Status command implementation.

use super::{with_store, CommandResult};
use crate::settings::Settings;
use serde::Serialize;
use yarndb_core::Datastore;

/// Datastore status as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Data directory.
    pub data_dir: String,
    /// Number of records.
    pub record_count: usize,
    /// Number of shards holding records.
    pub shard_count: usize,
    /// Indexed field paths.
    pub index_paths: Vec<String>,
    /// Unsaved changes.
    pub dirty: bool,
    /// Background save period in seconds.
    pub auto_save_interval: u64,
    /// Shard files found at load.
    pub files_scanned: usize,
    /// Shard files that failed to load.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_failures: Vec<String>,
}

impl StatusReport {
    /// Collects the report from an open datastore.
    pub fn collect(store: &Datastore, settings: &Settings) -> Self {
        let status = store.status();
        let load = store.load_report();
        Self {
            data_dir: settings.data_dir.display().to_string(),
            record_count: status.record_count,
            shard_count: status.shard_count,
            index_paths: status.index_paths,
            dirty: status.dirty,
            auto_save_interval: status.auto_save_interval.as_secs(),
            files_scanned: load.files_scanned,
            load_failures: load
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.file, f.error))
                .collect(),
        }
    }
}

/// Runs the status command.
pub fn run(settings: &Settings, format: &str) -> CommandResult {
    with_store(settings, |store| {
        let report = StatusReport::collect(store, settings);
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&report)?),
            _ => print_text(&report),
        }
        Ok(())
    })
}

fn print_text(report: &StatusReport) {
    println!("=== YarnDB Status ===");
    println!("Data directory: {}", report.data_dir);
    println!("Records: {}", report.record_count);
    println!("Shards: {}", report.shard_count);
    if report.index_paths.is_empty() {
        println!("Indexes: none");
    } else {
        println!("Indexes: {}", report.index_paths.join(", "));
    }
    println!("Unsaved changes: {}", if report.dirty { "yes" } else { "no" });
    println!("Auto-save interval: {}s", report.auto_save_interval);
    println!("Shard files: {}", report.files_scanned);
    for failure in &report.load_failures {
        println!("  failed: {failure}");
    }
}
