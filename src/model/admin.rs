use crate::model::EntityRecord;
use serde::{Deserialize, Serialize};

/// Dashboard role of an admin account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Superadmin,
    Admin,
    Editor,
}

impl AdminRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "superadmin" | "super_admin" => Some(AdminRole::Superadmin),
            "admin" => Some(AdminRole::Admin),
            "editor" => Some(AdminRole::Editor),
            _ => None,
        }
    }
}

/// Read-only view of an admin row
#[derive(Debug, Clone, Copy)]
pub struct AdminView<'a> {
    record: &'a EntityRecord,
}

impl<'a> AdminView<'a> {
    pub fn new(record: &'a EntityRecord) -> Self {
        Self { record }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.record.text("name")
    }

    pub fn email(&self) -> Option<&'a str> {
        self.record.text("email")
    }

    pub fn role(&self) -> Option<AdminRole> {
        self.record.text("role").and_then(AdminRole::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_view() {
        let record = EntityRecord::new("a-1")
            .with_field("name", "Lin")
            .with_field("email", "lin@example.com")
            .with_field("role", "Super_Admin");
        let view = AdminView::new(&record);

        assert_eq!(view.name(), Some("Lin"));
        assert_eq!(view.email(), Some("lin@example.com"));
        assert_eq!(view.role(), Some(AdminRole::Superadmin));
    }
}
