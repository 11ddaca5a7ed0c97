use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::model::Timestamp;
use crate::value::{FieldMap, FieldValue, ValueKind};

impl FieldValue {
    /// Converts a JSON value into a field value. Numbers map to integers when
    /// they fit `i64` and to doubles otherwise.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::null(),
            Value::Bool(flag) => FieldValue::from_bool(flag),
            Value::Number(number) => number_to_value(&number),
            Value::String(text) => FieldValue::from_string(text),
            Value::Array(items) => {
                FieldValue::from_array(items.into_iter().map(FieldValue::from_json).collect())
            }
            Value::Object(entries) => FieldValue::from_map(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, FieldValue::from_json(item)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON. Timestamps become RFC 3339 strings and
    /// references become their canonical path string, so the mapping is not
    /// reversible for those kinds.
    pub fn to_json(&self) -> Value {
        match self.kind() {
            ValueKind::Null => Value::Null,
            ValueKind::Boolean(flag) => Value::Bool(*flag),
            ValueKind::Integer(value) => Value::Number(Number::from(*value)),
            ValueKind::Double(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueKind::String(text) => Value::String(text.clone()),
            ValueKind::Timestamp(timestamp) => Value::String(format_timestamp(timestamp)),
            ValueKind::Reference(path) => Value::String(path.clone()),
            ValueKind::Array(array) => {
                Value::Array(array.values().iter().map(FieldValue::to_json).collect())
            }
            ValueKind::Map(map) => Value::Object(map_to_json(map)),
        }
    }
}

impl FieldMap {
    pub fn from_json(value: Value) -> Option<Self> {
        match FieldValue::from_json(value).kind() {
            ValueKind::Map(map) => Some(map.clone()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(map_to_json(self))
    }
}

fn number_to_value(number: &Number) -> FieldValue {
    if let Some(integer) = number.as_i64() {
        FieldValue::from_integer(integer)
    } else {
        FieldValue::from_double(number.as_f64().unwrap_or(f64::NAN))
    }
}

fn map_to_json(map: &FieldMap) -> Map<String, Value> {
    map.fields()
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

fn format_timestamp(timestamp: &Timestamp) -> String {
    let datetime: DateTime<Utc> = timestamp.to_datetime();
    datetime.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(value))
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldMap::from_json(value)
            .ok_or_else(|| D::Error::custom("field maps deserialize from JSON objects only"))
    }
}
