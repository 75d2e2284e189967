//! Datastore configuration.

use crate::error::{CoreError, CoreResult};
use crate::types::{FieldPath, ShardId};
use std::time::Duration;

/// Default period between background saves.
pub const DEFAULT_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Default lifetime of an idle transaction lease.
pub const DEFAULT_TRANSACTION_LEASE: Duration = Duration::from_secs(30);

/// Shard hint used for records without a usable hint.
pub const DEFAULT_SHARD: &str = "default";

/// Configuration for opening a datastore.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,

    /// How often dirty state is saved in the background (zero = never).
    pub auto_save_interval: Duration,

    /// How long a transaction may sit idle before its lease can be
    /// reclaimed by a new `begin_transaction`. Every write through the
    /// transaction renews it.
    pub transaction_lease: Duration,

    /// Shard hint for records with no usable hint.
    pub default_shard: String,

    /// Field paths to index right after loading.
    pub indexes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL,
            transaction_lease: DEFAULT_TRANSACTION_LEASE,
            default_shard: DEFAULT_SHARD.to_string(),
            indexes: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the data directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the background save interval. `Duration::ZERO` disables it.
    #[must_use]
    pub const fn auto_save_interval(mut self, interval: Duration) -> Self {
        self.auto_save_interval = interval;
        self
    }

    /// Sets the transaction lease.
    #[must_use]
    pub const fn transaction_lease(mut self, lease: Duration) -> Self {
        self.transaction_lease = lease;
        self
    }

    /// Sets the default shard hint.
    #[must_use]
    pub fn default_shard(mut self, hint: impl Into<String>) -> Self {
        self.default_shard = hint.into();
        self
    }

    /// Adds a field path to index after loading.
    #[must_use]
    pub fn index(mut self, path: impl Into<String>) -> Self {
        self.indexes.push(path.into());
        self
    }

    /// Checks the configuration and resolves the default shard.
    pub(crate) fn validate(&self) -> CoreResult<ShardId> {
        if self.transaction_lease.is_zero() {
            return Err(CoreError::invalid_config(
                "transaction lease must be greater than zero",
            ));
        }
        for path in &self.indexes {
            FieldPath::parse(path)?;
        }
        ShardId::parse(&self.default_shard).ok_or_else(|| {
            CoreError::invalid_config(format!(
                "default shard {:?} is not a valid shard hint",
                self.default_shard
            ))
        })
    }
}
