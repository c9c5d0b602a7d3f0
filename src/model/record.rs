use crate::model::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of a field inside an entity record.
///
/// Per-day attendance columns (`day1`, `day2`, ...) are kept apart from the
/// static fields so they can be walked in day order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Named(String),
    Day(u32),
}

impl FieldKey {
    pub fn named(name: impl Into<String>) -> Self {
        FieldKey::Named(name.into())
    }

    /// Wire name of the field
    pub fn as_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Named(name) => f.write_str(name),
            FieldKey::Day(n) => write!(f, "day{}", n),
        }
    }
}

/// `day<n>` with `n` written without leading zeros is a day column;
/// anything else (`day01`, `daylight`) is a named field.
impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        if let Some(digits) = value.strip_prefix("day") {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(n) = digits.parse::<u32>() {
                    if n.to_string() == digits {
                        return FieldKey::Day(n);
                    }
                }
            }
        }
        FieldKey::Named(value.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        FieldKey::from(value.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldKey::from(s))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("record has no id")]
    MissingId,
    #[error("record id must be an integer or a string, got {0}")]
    InvalidId(Value),
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(Value),
}

/// One row of domain data held client-side.
///
/// Serialized as the flat JSON object the API uses; `id` is pulled out,
/// `dayN` keys go to the day-indexed map, everything else is a static field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct EntityRecord {
    pub id: EntityId,
    fields: BTreeMap<String, Value>,
    days: BTreeMap<u32, Value>,
}

impl EntityRecord {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            days: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<FieldKey>, value: impl Into<Value>) -> Self {
        self.set(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &FieldKey) -> Option<&Value> {
        match key {
            FieldKey::Named(name) => self.fields.get(name),
            FieldKey::Day(n) => self.days.get(n),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.get(&FieldKey::from(name))
    }

    /// String value of a field, if the field holds a string
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: FieldKey, value: Value) {
        match key {
            FieldKey::Named(name) => {
                self.fields.insert(name, value);
            }
            FieldKey::Day(n) => {
                self.days.insert(n, value);
            }
        }
    }

    /// Static fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Day-indexed fields in day order
    pub fn days(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.days.iter().map(|(n, v)| (*n, v))
    }

    /// Field-level merge. `id` in the patch is ignored.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            self.set(FieldKey::from(key.as_str()), value.clone());
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.clone().into())
    }
}

fn id_from_value(value: Value) -> Result<EntityId, RecordError> {
    match value {
        Value::Number(n) => n.as_i64().map(EntityId::Num).ok_or(RecordError::InvalidId(Value::Number(n))),
        Value::String(s) => Ok(EntityId::Str(s)),
        other => Err(RecordError::InvalidId(other)),
    }
}

impl TryFrom<Map<String, Value>> for EntityRecord {
    type Error = RecordError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = id_from_value(map.remove("id").ok_or(RecordError::MissingId)?)?;
        let mut record = EntityRecord::new(id);
        for (key, value) in map {
            record.set(FieldKey::from(key), value);
        }
        Ok(record)
    }
}

impl TryFrom<Value> for EntityRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => EntityRecord::try_from(map),
            other => Err(RecordError::NotAnObject(other)),
        }
    }
}

impl From<EntityRecord> for Map<String, Value> {
    fn from(record: EntityRecord) -> Self {
        let mut map = Map::new();
        let id = match record.id {
            EntityId::Num(n) => Value::from(n),
            EntityId::Str(s) => Value::String(s),
        };
        map.insert("id".to_string(), id);
        for (name, value) in record.fields {
            map.insert(name, value);
        }
        for (day, value) in record.days {
            map.insert(FieldKey::Day(day).to_string(), value);
        }
        map
    }
}
