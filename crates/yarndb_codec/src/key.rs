//! Canonical byte keys for index lookups.
//!
//! Index keys use a CBOR-shaped canonical encoding so that two values
//! produce the same key exactly when they are the same document value:
//!
//! - Integers use the shortest encoding
//! - Map entries follow key order
//! - Floats are 8-byte IEEE 754, with `-0.0` folded into `0.0` and every
//!   NaN folded into one quiet NaN
//!
//! `Integer(1)` and `Float(1.0)` are different keys: matching is typed.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical NaN bit pattern.
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Hashable, totally ordered key derived from a [`Value`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(Vec<u8>);

impl IndexKey {
    /// Computes the key of a value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        let mut encoder = KeyEncoder::with_capacity(16);
        encoder.encode(value);
        Self(encoder.into_bytes())
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&Value> for IndexKey {
    fn from(value: &Value) -> Self {
        Self::of(value)
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexKey(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Encoder producing canonical key bytes.
struct KeyEncoder {
    buffer: Vec<u8>,
}

impl KeyEncoder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn encode(&mut self, value: &Value) {
        match value {
            Value::Null => self.buffer.push(0xf6),
            Value::Bool(b) => self.buffer.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(n) => self.encode_integer(*n),
            Value::Float(f) => self.encode_float(*f),
            Value::Text(s) => self.encode_text(s),
            Value::Array(items) => {
                self.encode_unsigned(4, items.len() as u64);
                for item in items {
                    self.encode(item);
                }
            }
            Value::Map(entries) => self.encode_map(entries),
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.encode_unsigned(0, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1, ...
            self.encode_unsigned(1, (-(n + 1)) as u64);
        }
    }

    fn encode_float(&mut self, f: f64) {
        let bits = if f.is_nan() {
            CANONICAL_NAN
        } else if f == 0.0 {
            0
        } else {
            f.to_bits()
        };
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&bits.to_be_bytes());
    }

    fn encode_text(&mut self, text: &str) {
        self.encode_unsigned(3, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    fn encode_map(&mut self, entries: &BTreeMap<String, Value>) {
        self.encode_unsigned(5, entries.len() as u64);
        for (key, value) in entries {
            self.encode_text(key);
            self.encode(value);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_unsigned(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.buffer.push(mt | (value as u8));
        } else if u8::try_from(value).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if u16::try_from(value).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if u32::try_from(value).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }
}
