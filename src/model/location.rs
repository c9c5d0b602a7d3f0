use crate::model::EntityRecord;
use serde_json::Value;

pub const LOCATION_NAME: &str = "name";
pub const LOCATION_ACTIVE: &str = "active";

/// Read-only view of a location row
#[derive(Debug, Clone, Copy)]
pub struct LocationView<'a> {
    record: &'a EntityRecord,
}

impl<'a> LocationView<'a> {
    pub fn new(record: &'a EntityRecord) -> Self {
        Self { record }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.record.text(LOCATION_NAME)
    }

    /// Locations without an `active` flag are treated as active
    pub fn is_active(&self) -> bool {
        match self.record.field(LOCATION_ACTIVE) {
            Some(Value::Bool(active)) => *active,
            Some(Value::Number(n)) => n.as_i64() != Some(0),
            Some(Value::String(s)) => !matches!(s.as_str(), "false" | "0" | "inactive"),
            _ => true,
        }
    }
}
