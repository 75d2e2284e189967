//! # YarnDB Codec
//!
//! Document values and shard encoding for YarnDB.
//!
//! This crate provides:
//! - [`Value`], the untyped document tree stored in every record
//! - [`IndexKey`], a canonical byte key used for exact-match lookups
//! - YAML encoding of shard files ([`encode_shard`] / [`decode_shard`])
//!
//! ## Usage
//!
//! ```
//! use yarndb_codec::{decode_shard, encode_shard, ShardRecords, Value};
//!
//! let mut records = ShardRecords::new();
//! records.insert("u1".into(), Value::map([("dept", "eng")]));
//!
//! let bytes = encode_shard(&records).unwrap();
//! assert_eq!(decode_shard(&bytes).unwrap(), records);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod key;
mod serialize;
mod shard;
mod value;

pub use error::{CodecError, CodecResult};
pub use key::IndexKey;
pub use shard::{decode_shard, encode_shard, parse_document, to_yaml, ShardRecords};
pub use value::Value;
