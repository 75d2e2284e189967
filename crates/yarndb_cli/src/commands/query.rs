//! Query and index commands.

use super::{validate_path, with_store, CliError, CommandResult};
use crate::settings::Settings;
use std::collections::BTreeMap;
use tracing::info;
use yarndb_codec::{parse_document, to_yaml, Value};

/// Splits `path=value`, parsing the value as YAML so `age=30` matches the
/// integer and `age='30'` the string.
pub fn parse_query(query: &str) -> Result<(&str, Value), CliError> {
    let (path, raw) = query
        .split_once('=')
        .ok_or_else(|| CliError::InvalidQuery(query.to_string()))?;
    let path = validate_path(path)?;
    let value = if raw.trim().is_empty() {
        Value::Null
    } else {
        parse_document(raw).map_err(|e| CliError::InvalidYaml(e.to_string()))?
    };
    Ok((path, value))
}

/// Runs the query command.
///
/// With `indexed`, an index over the path is built first; it lives only for
/// this run.
pub fn query(settings: &Settings, query: &str, indexed: bool, format: &str) -> CommandResult {
    let (path, value) = parse_query(query)?;

    with_store(settings, |store| {
        if indexed {
            store.create_index(path)?;
        }
        let found: BTreeMap<String, Value> = store.query(path, &value)?.into_iter().collect();
        info!(path, matches = found.len(), "query finished");

        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&found)?),
            _ if found.is_empty() => println!("No records match {query}"),
            _ => print!("{}", to_yaml(&Value::Map(found))?),
        }
        Ok(())
    })
}

/// Runs the index command: builds an index over `path` and reports how many
/// records it covers, or which record holds `lookup`.
pub fn index(settings: &Settings, path: &str, lookup: Option<&str>) -> CommandResult {
    let path = validate_path(path)?;
    let lookup = lookup
        .map(parse_document)
        .transpose()
        .map_err(|e| CliError::InvalidYaml(e.to_string()))?;

    with_store(settings, |store| {
        store.create_index(path)?;
        match lookup {
            Some(value) => match store.index_lookup(path, &value)? {
                Some(id) => println!("{id}"),
                None => println!("No record holds {path}={}", to_yaml(&value)?.trim_end()),
            },
            None => {
                let covered = store
                    .merge()?
                    .values()
                    .filter(|doc| doc.lookup(path.split('.')).is_some())
                    .count();
                println!("Indexed {path} over {covered} records");
            }
        }
        Ok(())
    })
}
