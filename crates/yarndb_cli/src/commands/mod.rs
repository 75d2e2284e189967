//! CLI command implementations.

pub mod apply;
pub mod init;
pub mod query;
pub mod record;
pub mod save;
pub mod status;

use crate::settings::Settings;
use thiserror::Error;
use yarndb_core::{Config, Datastore};

/// Result type shared by every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Argument errors caught before the datastore is touched.
#[derive(Debug, Error)]
pub enum CliError {
    /// A record id outside `[A-Za-z0-9_]+`.
    #[error("invalid record id '{0}': use letters, digits and '_'")]
    InvalidId(String),

    /// A field path outside `[A-Za-z0-9_.]+`.
    #[error("invalid field path '{0}': use letters, digits, '_' and '.'")]
    InvalidPath(String),

    /// A query not of the form `path=value`.
    #[error("invalid query '{0}': expected path=value")]
    InvalidQuery(String),

    /// A document or value that is not YAML.
    #[error("invalid YAML: {0}")]
    InvalidYaml(String),
}

/// Checks a record id.
pub fn validate_id(id: &str) -> Result<&str, CliError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(id)
    } else {
        Err(CliError::InvalidId(id.to_string()))
    }
}

/// Checks a field path.
pub fn validate_path(path: &str) -> Result<&str, CliError> {
    if !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        Ok(path)
    } else {
        Err(CliError::InvalidPath(path.to_string()))
    }
}

/// Opens the datastore the settings point at.
pub fn open(settings: &Settings) -> Result<Datastore, Box<dyn std::error::Error>> {
    let config = Config::new().auto_save_interval(settings.auto_save());
    Ok(Datastore::open_with_config(&settings.data_dir, config)?)
}

/// Runs `f` against an open datastore, then closes it so pending changes
/// are saved even when `f` fails.
pub fn with_store<F>(settings: &Settings, f: F) -> CommandResult
where
    F: FnOnce(&Datastore) -> CommandResult,
{
    let store = open(settings)?;
    let outcome = f(&store);
    let closed = store.close();
    outcome?;
    closed?;
    Ok(())
}
