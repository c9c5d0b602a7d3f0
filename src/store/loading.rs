use crate::model::{EntityId, FieldKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Marks one field of one row as having a request in flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadingKey {
    pub entity: EntityId,
    pub field: FieldKey,
}

impl LoadingKey {
    pub fn new(entity: EntityId, field: FieldKey) -> Self {
        Self { entity, field }
    }
}

/// `{entityId}-{fieldName}`, e.g. `42-enrollmentProgress`
impl fmt::Display for LoadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.entity, self.field)
    }
}

/// Busy flags for individual cells of a table.
///
/// A key counts the requests in flight for it, so overlapping edits of the
/// same cell keep it busy until the last one settles. Keys at zero are
/// removed; an absent key reads as not loading.
#[derive(Debug, Clone, Default)]
pub struct LoadingRegistry {
    in_flight: Arc<Mutex<HashMap<LoadingKey, usize>>>,
}

impl LoadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `keys` busy until the returned guard is dropped
    pub fn begin(&self, keys: Vec<LoadingKey>) -> LoadingGuard {
        let mut in_flight = self.in_flight.lock();
        for key in &keys {
            *in_flight.entry(key.clone()).or_insert(0) += 1;
        }
        LoadingGuard {
            registry: self.clone(),
            keys,
        }
    }

    pub fn is_loading(&self, entity: &EntityId, field: &FieldKey) -> bool {
        self.is_key_loading(&LoadingKey::new(entity.clone(), field.clone()))
    }

    pub fn is_key_loading(&self, key: &LoadingKey) -> bool {
        self.in_flight.lock().get(key).is_some_and(|count| *count > 0)
    }

    /// Lookup by rendered key, e.g. `"42-enrollmentProgress"`
    pub fn flag(&self, rendered: &str) -> bool {
        self.in_flight
            .lock()
            .iter()
            .any(|(key, count)| *count > 0 && key.to_string() == rendered)
    }

    /// Keys currently busy, sorted
    pub fn busy_keys(&self) -> Vec<LoadingKey> {
        let mut keys: Vec<LoadingKey> = self
            .in_flight
            .lock()
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.lock().is_empty()
    }

    fn release(&self, keys: &[LoadingKey]) {
        let mut in_flight = self.in_flight.lock();
        for key in keys {
            if let Some(count) = in_flight.get_mut(key) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    in_flight.remove(key);
                }
            }
        }
    }
}

/// Clears its keys when dropped, whether the request succeeded, failed or was cancelled
#[must_use = "the keys are released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard {
    registry: LoadingRegistry,
    keys: Vec<LoadingKey>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.registry.release(&self.keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i64, field: &str) -> LoadingKey {
        LoadingKey::new(EntityId::Num(id), FieldKey::from(field))
    }

    #[test]
    fn test_key_rendering() {
        assert_eq!(key(42, "enrollmentProgress").to_string(), "42-enrollmentProgress");
        assert_eq!(key(7, "day3").to_string(), "7-day3");
    }

    #[test]
    fn test_guard_scopes_loading_to_its_keys() {
        let registry = LoadingRegistry::new();
        let guard = registry.begin(vec![key(42, "mealType")]);

        assert!(registry.is_key_loading(&key(42, "mealType")));
        assert!(registry.flag("42-mealType"));
        assert!(!registry.is_key_loading(&key(42, "enrollmentProgress")));
        assert!(!registry.is_key_loading(&key(43, "mealType")));

        drop(guard);
        assert!(!registry.flag("42-mealType"));
        assert!(registry.is_idle());
    }

    #[test]
    fn test_overlapping_requests_on_same_key() {
        let registry = LoadingRegistry::new();
        let first = registry.begin(vec![key(1, "active")]);
        let second = registry.begin(vec![key(1, "active")]);

        drop(first);
        assert!(registry.is_key_loading(&key(1, "active")));
        drop(second);
        assert!(!registry.is_key_loading(&key(1, "active")));
    }

    #[test]
    fn test_busy_keys_sorted() {
        let registry = LoadingRegistry::new();
        let _a = registry.begin(vec![key(2, "name"), key(1, "name")]);
        let rendered: Vec<String> = registry.busy_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["1-name", "2-name"]);
    }
}
