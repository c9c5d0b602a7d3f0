use log::{debug, info};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiResult, RemoteApi};
use crate::logic::Notifications;
use crate::model::{EntityId, EntityRecord, FieldKey, Resource, Session};
use crate::store::{LoadingKey, LoadingRegistry, RowStore};

/// Resolve `fut` unless `token` is cancelled first
pub async fn until_cancelled<T, F>(token: &CancellationToken, fut: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    if token.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}

/// Latest dispatch per loading key
#[derive(Debug, Default)]
struct SequenceTable {
    next: u64,
    latest: HashMap<LoadingKey, u64>,
}

impl SequenceTable {
    fn issue(&mut self, keys: &[LoadingKey]) -> u64 {
        self.next += 1;
        for key in keys {
            self.latest.insert(key.clone(), self.next);
        }
        self.next
    }

    fn is_current(&self, key: &LoadingKey, seq: u64) -> bool {
        self.latest.get(key) == Some(&seq)
    }

    /// Forget keys this dispatch still owns
    fn settle(&mut self, keys: &[LoadingKey], seq: u64) {
        for key in keys {
            if self.is_current(key, seq) {
                self.latest.remove(key);
            }
        }
    }
}

/// Result of a successful field update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Fields merged into the row
    pub applied: Vec<FieldKey>,
    /// Fields skipped because a newer edit of the same field was dispatched
    pub superseded: Vec<FieldKey>,
    /// The row after the merge, if it is still in the store
    pub record: Option<EntityRecord>,
}

/// Sends per-field PATCH requests for one resource and merges confirmed
/// values back into the row store.
///
/// The row only changes after the server confirms. While a request is in
/// flight the loading keys of its fields are busy; they clear once the
/// request settles, whatever the outcome.
#[derive(Clone)]
pub struct FieldUpdateDispatcher {
    api: Arc<dyn RemoteApi>,
    resource: Resource,
    rows: RowStore,
    loading: LoadingRegistry,
    notices: Notifications,
    sequences: Arc<Mutex<SequenceTable>>,
    cancel: CancellationToken,
}

impl FieldUpdateDispatcher {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        resource: Resource,
        rows: RowStore,
        loading: LoadingRegistry,
        notices: Notifications,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            resource,
            rows,
            loading,
            notices,
            sequences: Arc::new(Mutex::new(SequenceTable::default())),
            cancel,
        }
    }

    /// Convenience for the common single-field edit
    pub async fn update_field(
        &self,
        session: &Session,
        id: &EntityId,
        field: FieldKey,
        value: Value,
    ) -> ApiResult<UpdateOutcome> {
        let mut payload = Map::new();
        payload.insert(field.as_wire(), value);
        self.update(session, id, payload).await
    }

    /// PATCH `payload` for row `id` and merge the confirmed values.
    ///
    /// On failure the row is left as it was, an error notice is raised and
    /// the error is returned. Cancelled requests raise no notice and touch
    /// no state.
    pub async fn update(
        &self,
        session: &Session,
        id: &EntityId,
        payload: Map<String, Value>,
    ) -> ApiResult<UpdateOutcome> {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let payload: Map<String, Value> =
            payload.into_iter().filter(|(name, _)| name != "id").collect();
        if payload.is_empty() {
            return Err(ApiError::EmptyPayload);
        }
        if !self.rows.contains(id) {
            return Err(ApiError::UnknownEntity {
                resource: self.resource,
                id: id.clone(),
            });
        }

        let keys: Vec<LoadingKey> = payload
            .keys()
            .map(|name| LoadingKey::new(id.clone(), FieldKey::from(name.as_str())))
            .collect();
        let seq = self.sequences.lock().issue(&keys);
        let guard = self.loading.begin(keys.clone());
        debug!("{} {}: dispatch #{} for {:?}", self.resource, id, seq, payload.keys());

        let result = until_cancelled(
            &self.cancel,
            self.api.patch(session, self.resource, id, &payload),
        )
        .await;

        let outcome = match result {
            Ok(data) => Ok(self.apply(id, &keys, seq, &payload, data)),
            Err(err) => {
                if !err.is_cancelled() {
                    self.notices.error(format!(
                        "Could not update {} {}: {}",
                        self.resource,
                        id,
                        err.user_message()
                    ));
                }
                Err(err)
            }
        };

        self.sequences.lock().settle(&keys, seq);
        drop(guard);
        outcome
    }

    fn apply(
        &self,
        id: &EntityId,
        keys: &[LoadingKey],
        seq: u64,
        payload: &Map<String, Value>,
        data: Option<Value>,
    ) -> UpdateOutcome {
        let (current, superseded): (Vec<&LoadingKey>, Vec<&LoadingKey>) = {
            let sequences = self.sequences.lock();
            keys.iter().partition(|key| sequences.is_current(key, seq))
        };
        let superseded_names: Vec<String> = superseded.iter().map(|k| k.field.as_wire()).collect();

        let mut merged: Map<String, Value> = payload
            .iter()
            .filter(|(name, _)| !superseded_names.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        // Server-normalised values win, except for fields a newer edit owns.
        if let Some(Value::Object(returned)) = data {
            for (name, value) in returned {
                if name == "id" || superseded_names.contains(&name) {
                    continue;
                }
                merged.insert(name, value);
            }
        }

        if !superseded.is_empty() {
            debug!(
                "{} {}: dispatch #{} superseded for {:?}",
                self.resource, id, seq, superseded_names
            );
        }

        if !merged.is_empty() && !self.rows.merge_fields(id, &merged) {
            debug!("{} {}: row gone before response arrived", self.resource, id);
        }

        let applied: Vec<FieldKey> = current.iter().map(|k| k.field.clone()).collect();
        if !applied.is_empty() {
            info!("{} {}: updated {:?}", self.resource, id, merged.keys());
        }

        UpdateOutcome {
            applied,
            superseded: superseded.iter().map(|k| k.field.clone()).collect(),
            record: self.rows.get(id),
        }
    }
}
