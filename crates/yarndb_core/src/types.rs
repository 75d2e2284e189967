//! Core type definitions for YarnDB.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use yarndb_codec::Value;

/// File name prefix shared by every shard file.
pub const SHARD_PREFIX: &str = "records_";

/// File name extension of shard files.
pub const SHARD_EXTENSION: &str = ".yaml";

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Identifier of a shard, i.e. the hint its file name is derived from.
///
/// A shard with hint `users` lives in `records_users.yaml`. Hints are
/// non-empty and made of ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardId(String);

impl ShardId {
    /// Parses a shard hint. Returns `None` if the hint is not usable as
    /// part of a file name.
    #[must_use]
    pub fn parse(hint: &str) -> Option<Self> {
        let valid = !hint.is_empty()
            && hint
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self(hint.to_string()))
    }

    /// Derives a shard from the id-prefix convention: the part of the
    /// record id before the first `_`, or the whole id if it has none.
    ///
    /// ```rust
    /// use yarndb_core::ShardId;
    ///
    /// assert_eq!(ShardId::for_record("users_17").unwrap().as_str(), "users");
    /// assert_eq!(ShardId::for_record("u1").unwrap().as_str(), "u1");
    /// assert!(ShardId::for_record("_x").is_none());
    /// ```
    #[must_use]
    pub fn for_record(id: &str) -> Option<Self> {
        let prefix = id.split('_').next().unwrap_or(id);
        Self::parse(prefix)
    }

    /// Recovers the shard from a shard file name such as
    /// `records_users.yaml`. Other file names yield `None`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_prefix(SHARD_PREFIX)
            .and_then(|rest| rest.strip_suffix(SHARD_EXTENSION))
            .and_then(Self::parse)
    }

    /// Returns the shard file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{SHARD_PREFIX}{}{SHARD_EXTENSION}", self.0)
    }

    /// Returns the hint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dotted path addressing a nested map field, e.g. `address.city`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted field path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPath`] if the path is empty or has an
    /// empty segment (`a..b`, `.a`, `a.`).
    pub fn parse(path: &str) -> CoreResult<Self> {
        if path.is_empty() {
            return Err(CoreError::invalid_path(path, "path is empty"));
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CoreError::invalid_path(path, "path has an empty segment"));
        }
        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// Returns the path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the individual segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Evaluates the path against a document.
    ///
    /// A missing segment or a step through a non-map value is "absent".
    #[must_use]
    pub fn evaluate<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        document.lookup(&self.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_ordering() {
        let t1 = TransactionId::new(1);
        let t2 = TransactionId::new(2);
        assert!(t1 < t2);
        assert_eq!(format!("{t2}"), "txn:2");
    }

    #[test]
    fn shard_hint_validation() {
        assert!(ShardId::parse("users").is_some());
        assert!(ShardId::parse("eu-west_2").is_some());
        assert!(ShardId::parse("").is_none());
        assert!(ShardId::parse("a/b").is_none());
        assert!(ShardId::parse("a.b").is_none());
        assert!(ShardId::parse("..").is_none());
    }

    #[test]
    fn shard_file_names_roundtrip() {
        let shard = ShardId::parse("users").unwrap();
        assert_eq!(shard.file_name(), "records_users.yaml");
        assert_eq!(ShardId::from_file_name("records_users.yaml"), Some(shard));
    }

    #[test]
    fn foreign_file_names_are_not_shards() {
        assert_eq!(ShardId::from_file_name("config.yaml"), None);
        assert_eq!(ShardId::from_file_name("records_.yaml"), None);
        assert_eq!(ShardId::from_file_name("records_a.yml"), None);
        assert_eq!(ShardId::from_file_name("LOCK"), None);
    }

    #[test]
    fn record_prefix_convention() {
        assert_eq!(ShardId::for_record("orders_2024_1").unwrap().as_str(), "orders");
        assert!(ShardId::for_record("").is_none());
    }

    #[test]
    fn field_path_parsing() {
        let path = FieldPath::parse("address.city").unwrap();
        assert_eq!(path.segments(), ["address", "city"]);
        assert_eq!(path.as_str(), "address.city");

        for bad in ["", ".", "a.", ".a", "a..b"] {
            assert!(FieldPath::parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn field_path_evaluation() {
        let doc = Value::map([("address", Value::map([("city", "Oslo")]))]);
        let city = FieldPath::parse("address.city").unwrap();
        let deep = FieldPath::parse("address.city.name").unwrap();

        assert_eq!(city.evaluate(&doc), Some(&Value::from("Oslo")));
        assert_eq!(deep.evaluate(&doc), None);
    }
}
