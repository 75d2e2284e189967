//! Shard file encoding.
//!
//! A shard file is one YAML document: a mapping from record id to record
//! document. An empty file (or one holding only `~`) is an empty shard.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// Decoded contents of one shard file, ordered by record id.
pub type ShardRecords = BTreeMap<String, Value>;

/// Encodes records into shard file bytes.
///
/// Output is deterministic: records appear in id order and map keys in
/// key order.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn encode_shard(records: &ShardRecords) -> CodecResult<Vec<u8>> {
    serde_yaml::to_string(records)
        .map(String::into_bytes)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Decodes shard file bytes into records.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8 YAML, or if the root is
/// anything other than a mapping.
pub fn decode_shard(bytes: &[u8]) -> CodecResult<ShardRecords> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::decoding_failed(format!("shard is not UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Ok(ShardRecords::new());
    }

    match parse_document(text)? {
        Value::Map(records) => Ok(records),
        Value::Null => Ok(ShardRecords::new()),
        other => Err(CodecError::invalid_shard(format!(
            "expected a mapping of record ids, found {}",
            other.kind()
        ))),
    }
}

/// Parses one YAML document into a [`Value`].
///
/// # Errors
///
/// Returns an error if the text is not a single valid YAML document.
pub fn parse_document(text: &str) -> CodecResult<Value> {
    serde_yaml::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Renders a [`Value`] as a YAML document.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn to_yaml(value: &Value) -> CodecResult<String> {
    serde_yaml::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}
