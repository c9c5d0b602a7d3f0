use serde_json::Value;

use crate::model::{EntityId, EntityRecord, FilterState};

/// Dotted path into a record, e.g. `name`, `day3` or `student.email`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPath<'a>(pub &'a str);

impl<'a> FieldPath<'a> {
    /// Extract the value at this path, `id` included
    pub fn extract(&self, record: &EntityRecord) -> Option<Value> {
        let mut segments = self.0.split('.');
        let head = segments.next()?;

        let mut current = if head == "id" {
            match &record.id {
                EntityId::Num(n) => Value::from(*n),
                EntityId::Str(s) => Value::String(s.clone()),
            }
        } else {
            record.field(head)?.clone()
        };

        for segment in segments {
            current = current.get(segment)?.clone();
        }
        Some(current)
    }
}

/// Row filter evaluator for list views
pub struct RowFilterEvaluator;

impl RowFilterEvaluator {
    /// Rows matching `filter`, in their original order
    pub fn filter_records(records: &[EntityRecord], filter: &FilterState) -> Vec<EntityRecord> {
        if filter.is_empty() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|record| Self::matches(record, filter))
            .cloned()
            .collect()
    }

    pub fn matches(record: &EntityRecord, filter: &FilterState) -> bool {
        Self::matches_search(record, filter) && Self::matches_exact(record, filter)
    }

    /// Case-insensitive substring over any search field.
    /// With no search fields listed every static field is searched.
    fn matches_search(record: &EntityRecord, filter: &FilterState) -> bool {
        let needle = filter.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }

        if filter.search_fields.is_empty() {
            return record
                .fields()
                .any(|(_, value)| Self::contains(Some(value), &needle));
        }

        filter
            .search_fields
            .iter()
            .any(|field| Self::contains(FieldPath(field).extract(record).as_ref(), &needle))
    }

    fn matches_exact(record: &EntityRecord, filter: &FilterState) -> bool {
        filter.exact.iter().all(|(field, expected)| {
            Self::values_match(FieldPath(field).extract(record).as_ref(), expected)
        })
    }

    fn contains(value: Option<&Value>, needle_lower: &str) -> bool {
        match Self::scalar_text(value) {
            Some(text) => text.to_lowercase().contains(needle_lower),
            None => false,
        }
    }

    fn scalar_text(value: Option<&Value>) -> Option<String> {
        match value? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Exact match. A string criterion also matches a number or boolean
    /// rendering to the same text, since select inputs hand back strings.
    fn values_match(actual: Option<&Value>, expected: &Value) -> bool {
        match (actual, expected) {
            (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
            (Some(actual), expected) if actual == expected => true,
            (Some(actual @ (Value::Bool(_) | Value::Number(_))), Value::String(s)) => {
                Self::scalar_text(Some(actual)).as_deref() == Some(s.as_str())
            }
            _ => false,
        }
    }
}

/// Filter rows for display; never mutates its inputs
pub fn filter_records(records: &[EntityRecord], filter: &FilterState) -> Vec<EntityRecord> {
    RowFilterEvaluator::filter_records(records, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster() -> Vec<EntityRecord> {
        let names = [
            "Ada Lovelace",
            "Alan Turing",
            "Grace Hopper",
            "Adam Smith",
            "Barbara Liskov",
            "Edsger Dijkstra",
            "Katherine Johnson",
            "Donald Knuth",
            "Madam Curie",
            "Linus Torvalds",
        ];
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                EntityRecord::new(i as i64 + 1)
                    .with_field("name", *name)
                    .with_field("mealType", if i % 2 == 0 { "vegan" } else { "standard" })
                    .with_field("active", i % 3 != 0)
            })
            .collect()
    }

    #[test]
    fn test_substring_match_preserves_order() {
        let rows = roster();
        let filter = FilterState::new().with_search("ADA", ["name"]);
        let result = filter_records(&rows, &filter);

        let ids: Vec<EntityId> = result.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Num(1), EntityId::Num(4), EntityId::Num(9)]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rows = roster();
        let filter = FilterState::new()
            .with_search("a", ["name"])
            .with_exact("mealType", "vegan");

        let once = filter_records(&rows, &filter);
        let twice = filter_records(&once, &filter);
        assert_eq!(once, twice);
        assert_eq!(rows, roster());
    }

    #[test]
    fn test_exact_match_on_boolean_and_string_criterion() {
        let rows = roster();
        let active = filter_records(&rows, &FilterState::new().with_exact("active", true));
        let active_from_select =
            filter_records(&rows, &FilterState::new().with_exact("active", "true"));

        assert_eq!(active.len(), 6);
        assert_eq!(active, active_from_select);
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let rows = roster();
        let filter = FilterState::new().with_search("", ["name"]);
        assert_eq!(filter_records(&rows, &filter).len(), rows.len());
    }

    #[test]
    fn test_search_text_is_matched_as_typed() {
        let rows = roster();
        let leading = filter_records(&rows, &FilterState::new().with_search(" smith", ["name"]));
        let ids: Vec<EntityId> = leading.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Num(4)]);

        let trailing = FilterState::new().with_search("smith ", ["name"]);
        assert!(filter_records(&rows, &trailing).is_empty());
    }

    #[test]
    fn test_nested_and_day_paths() {
        let record: EntityRecord = serde_json::from_value(json!({
            "id": 5,
            "student": {"email": "Ada@Example.com"},
            "day2": "present"
        }))
        .unwrap();

        assert_eq!(
            FieldPath("student.email").extract(&record),
            Some(json!("Ada@Example.com"))
        );
        assert_eq!(FieldPath("id").extract(&record), Some(json!(5)));

        let by_email = FilterState::new().with_search("example.com", ["student.email"]);
        assert!(RowFilterEvaluator::matches(&record, &by_email));

        let by_day = FilterState::new().with_exact("day2", "present");
        assert!(RowFilterEvaluator::matches(&record, &by_day));

        let missing = FilterState::new().with_exact("day1", "present");
        assert!(!RowFilterEvaluator::matches(&record, &missing));
    }

    #[test]
    fn test_search_without_fields_scans_static_fields() {
        let rows = roster();
        let filter = FilterState::new().with_search("standard", Vec::<String>::new());
        assert_eq!(filter_records(&rows, &filter).len(), 5);
    }
}
