//! Serde support for [`Value`].
//!
//! Mapping keys that arrive as scalars other than strings (YAML allows
//! `1: x` or `true: y`) are converted to their text form, since document
//! keys are strings.

use crate::value::Value;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| E::custom(format!("integer {v} is out of range for i64")))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((MapKey(key), value)) = access.next_entry::<MapKey, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }
}

/// A mapping key, accepted from any scalar.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapKeyVisitor)
    }
}

struct MapKeyVisitor;

impl<'de> Visitor<'de> for MapKeyVisitor {
    type Value = MapKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E>(self, v: bool) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_i64<E>(self, v: i64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_str<E>(self, v: &str) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<MapKey, E> {
        Ok(MapKey(v))
    }

    fn visit_unit<E>(self) -> Result<MapKey, E> {
        Ok(MapKey("null".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn scalars_from_yaml() {
        assert_eq!(from_yaml("~"), Value::Null);
        assert_eq!(from_yaml("true"), Value::Bool(true));
        assert_eq!(from_yaml("-12"), Value::Integer(-12));
        assert_eq!(from_yaml("2.5"), Value::Float(2.5));
        assert_eq!(from_yaml("eng"), Value::from("eng"));
        assert_eq!(from_yaml("'42'"), Value::from("42"));
    }

    #[test]
    fn nested_from_yaml() {
        let v = from_yaml("name: Ann\naddress:\n  city: Oslo\ntags: [a, b]\n");
        assert_eq!(v.lookup(["address", "city"]), Some(&Value::from("Oslo")));
        assert_eq!(v.get("tags"), Some(&Value::from(vec!["a", "b"])));
    }

    #[test]
    fn non_string_keys_become_text() {
        let v = from_yaml("1: one\ntrue: yes\n");
        assert_eq!(v.get("1"), Some(&Value::from("one")));
        assert!(v.get("true").is_some());
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let result: Result<Value, _> = serde_yaml::from_str("18446744073709551615");
        assert!(result.is_err());
    }

    #[test]
    fn strings_that_look_like_numbers_stay_strings() {
        let original = Value::map([("zip", Value::from("0150")), ("n", Value::from("12"))]);
        let text = serde_yaml::to_string(&original).unwrap();
        assert_eq!(from_yaml(&text), original);
    }
}
