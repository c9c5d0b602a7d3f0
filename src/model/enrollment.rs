use crate::model::{EntityId, EntityRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ENROLLMENT_PROGRESS: &str = "enrollmentProgress";
pub const MEAL_TYPE: &str = "mealType";

/// Pass/fail state derived from the `enrollmentProgress` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentProgress {
    Pass,
    Fail,
    Pending,
}

impl EnrollmentProgress {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "pass" | "passed" => EnrollmentProgress::Pass,
                "fail" | "failed" => EnrollmentProgress::Fail,
                _ => EnrollmentProgress::Pending,
            },
            Some(Value::Bool(true)) => EnrollmentProgress::Pass,
            Some(Value::Bool(false)) => EnrollmentProgress::Fail,
            _ => EnrollmentProgress::Pending,
        }
    }

    /// Label shown in the roster's pass/fail column
    pub fn label(&self) -> &'static str {
        match self {
            EnrollmentProgress::Pass => "Pass",
            EnrollmentProgress::Fail => "Fail",
            EnrollmentProgress::Pending => "Pending",
        }
    }
}

/// Read-only view of an enrollment roster row
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentView<'a> {
    record: &'a EntityRecord,
}

impl<'a> EnrollmentView<'a> {
    pub fn new(record: &'a EntityRecord) -> Self {
        Self { record }
    }

    pub fn id(&self) -> &EntityId {
        &self.record.id
    }

    pub fn progress(&self) -> EnrollmentProgress {
        EnrollmentProgress::from_value(self.record.field(ENROLLMENT_PROGRESS))
    }

    pub fn meal_type(&self) -> Option<&'a str> {
        self.record.text(MEAL_TYPE)
    }

    /// Student name, either flattened or nested under `student`
    pub fn student_name(&self) -> Option<&'a str> {
        self.record.text("studentName").or_else(|| {
            self.record
                .field("student")
                .and_then(|s| s.get("name"))
                .and_then(Value::as_str)
        })
    }

    /// Attendance marks in day order
    pub fn attendance(&self) -> Vec<(u32, &'a str)> {
        self.record
            .days()
            .filter_map(|(day, value)| value.as_str().map(|mark| (day, mark)))
            .collect()
    }
}
