//! Set, get and delete commands.

use super::{validate_id, with_store, CliError, CommandResult};
use crate::settings::Settings;
use tracing::{info, warn};
use yarndb_codec::{parse_document, to_yaml};
use yarndb_core::ShardId;

/// Runs the set command.
pub fn set(settings: &Settings, id: &str, yaml: &str) -> CommandResult {
    let id = validate_id(id)?;
    let document = parse_document(yaml).map_err(|e| CliError::InvalidYaml(e.to_string()))?;

    with_store(settings, |store| {
        // An empty hint lets the store derive the shard from the id prefix.
        store.set(id, document, "")?;
        let shard = ShardId::for_record(id)
            .map_or_else(|| store.config().default_shard.clone(), |s| s.to_string());
        info!(id, shard = %shard, "record set");
        println!("Set record {id}");
        Ok(())
    })
}

/// Runs the get command.
pub fn get(settings: &Settings, id: &str, format: &str) -> CommandResult {
    let id = validate_id(id)?;

    with_store(settings, |store| {
        match store.get(id)? {
            Some(document) => match format {
                "json" => println!("{}", serde_json::to_string_pretty(&document)?),
                _ => print!("{}", to_yaml(&document)?),
            },
            None => {
                warn!(id, "record not found");
                println!("Record {id} not found");
            }
        }
        Ok(())
    })
}

/// Runs the delete command.
pub fn delete(settings: &Settings, id: &str) -> CommandResult {
    let id = validate_id(id)?;

    with_store(settings, |store| {
        store.delete(id)?;
        info!(id, "record deleted");
        println!("Deleted record {id}");
        Ok(())
    })
}
