//! Apply command: runs a YAML batch in one transaction.
//!
//! The batch is a sequence of operations:
//!
//! ```yaml
//! - set: { id: users_1, document: { name: Ann, dept: eng } }
//! - set: { id: o1, document: { total: 42 }, shard: orders }
//! - delete: { id: users_2 }
//! ```

use super::{validate_id, with_store, CliError, CommandResult};
use crate::settings::Settings;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;
use yarndb_codec::Value;

/// One batch operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum BatchOp {
    /// Insert or replace a record.
    Set {
        /// Record id.
        id: String,
        /// Document.
        document: Value,
        /// Shard hint; empty derives it from the id.
        #[serde(default)]
        shard: String,
    },
    /// Delete a record if present.
    Delete {
        /// Record id.
        id: String,
    },
}

/// A batch entry, written as a single-key map (`set: {...}`).
#[derive(Deserialize)]
#[serde(transparent)]
struct BatchEntry(#[serde(with = "serde_yaml::with::singleton_map")] BatchOp);

impl BatchOp {
    fn id(&self) -> &str {
        match self {
            BatchOp::Set { id, .. } | BatchOp::Delete { id } => id,
        }
    }
}

/// Parses and validates a batch.
pub fn parse_batch(text: &str) -> Result<Vec<BatchOp>, CliError> {
    let entries: Vec<BatchEntry> =
        serde_yaml::from_str(text).map_err(|e| CliError::InvalidYaml(e.to_string()))?;
    let ops: Vec<BatchOp> = entries.into_iter().map(|BatchEntry(op)| op).collect();
    for op in &ops {
        validate_id(op.id())?;
    }
    Ok(ops)
}

/// Runs the apply command.
pub fn run(settings: &Settings, file: &Path) -> CommandResult {
    let text = fs::read_to_string(file)?;
    let ops = parse_batch(&text)?;

    with_store(settings, |store| {
        // Leaving early drops the handle, which rolls the batch back.
        let mut txn = store.begin_transaction()?;
        for op in ops {
            match op {
                BatchOp::Set {
                    id,
                    document,
                    shard,
                } => txn.set(&id, document, &shard)?,
                BatchOp::Delete { id } => txn.delete(&id)?,
            }
        }
        let summary = txn.commit()?;
        info!(
            puts = summary.puts,
            deletes = summary.deletes,
            skipped = summary.skipped,
            "batch applied"
        );
        println!(
            "Applied {} sets and {} deletes ({} deletes skipped)",
            summary.puts, summary.deletes, summary.skipped
        );
        Ok(())
    })
}
