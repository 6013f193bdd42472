//! `serde::Serialize` support, enabled by the `serde` feature.
//!
//! Dictionaries serialize as maps in insertion order, arrays as sequences,
//! dates as their ISO-8601 text, data as bytes, UIDs as `{"CF$UID": n}` and
//! null as unit.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{Array, Date, Dictionary, Node, Value};

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value() {
            Value::Dictionary(dict) => dict.serialize(serializer),
            Value::Array(array) => array.serialize(serializer),
            Value::String(s) => serializer.serialize_str(&s),
            Value::Integer(i) => {
                if let Ok(value) = i64::try_from(i) {
                    serializer.serialize_i64(value)
                } else if let Ok(value) = u64::try_from(i) {
                    serializer.serialize_u64(value)
                } else {
                    serializer.serialize_i128(i)
                }
            }
            Value::Real(r) => serializer.serialize_f64(r),
            Value::Boolean(b) => serializer.serialize_bool(b),
            Value::Date(d) => d.serialize(serializer),
            Value::Data(d) => serializer.serialize_bytes(&d),
            Value::Uid(u) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("CF$UID", &u)?;
                map.end()
            }
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self.iter() {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
