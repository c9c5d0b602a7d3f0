use log::{debug, info};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiResult, RemoteApi};
use crate::logic::{filter_records, until_cancelled, FieldUpdateDispatcher, Notifications, UpdateOutcome};
use crate::model::{EntityId, EntityRecord, FieldKey, FilterState, Resource, Session};
use crate::store::{LoadingRegistry, RowStore};

/// An editable list of one resource, as a dashboard page holds it while mounted.
///
/// Owns the rows, the busy flags of its cells, its filter inputs and its
/// notices. Every request goes through the view's lifetime token, so nothing
/// is written back once `unmount` has been called.
pub struct TableView {
    resource: Resource,
    api: Arc<dyn RemoteApi>,
    session: Session,
    rows: RowStore,
    loading: LoadingRegistry,
    notices: Notifications,
    filter: FilterState,
    dispatcher: FieldUpdateDispatcher,
    lifetime: CancellationToken,
}

impl TableView {
    pub fn new(api: Arc<dyn RemoteApi>, session: Session, resource: Resource) -> Self {
        let rows = RowStore::new();
        let loading = LoadingRegistry::new();
        let notices = Notifications::new();
        let lifetime = CancellationToken::new();
        let dispatcher = FieldUpdateDispatcher::new(
            api.clone(),
            resource,
            rows.clone(),
            loading.clone(),
            notices.clone(),
            lifetime.child_token(),
        );

        Self {
            resource,
            api,
            session,
            rows,
            loading,
            notices,
            filter: FilterState::default(),
            dispatcher,
            lifetime,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn loading(&self) -> &LoadingRegistry {
        &self.loading
    }

    pub fn notices(&self) -> &Notifications {
        &self.notices
    }

    pub fn is_mounted(&self) -> bool {
        !self.lifetime.is_cancelled()
    }

    /// Initial list fetch. On failure the current rows are kept.
    pub async fn mount(&self) -> ApiResult<usize> {
        self.refresh().await
    }

    /// Refetch the list, replacing every row
    pub async fn refresh(&self) -> ApiResult<usize> {
        let result = until_cancelled(&self.lifetime, self.api.list(&self.session, self.resource)).await;
        match result {
            Ok(records) => {
                self.rows.replace_all(records);
                let count = self.rows.len();
                debug!("{}: loaded {} rows", self.resource, count);
                Ok(count)
            }
            Err(err) => Err(self.report(format!("Could not load {}", self.resource), err)),
        }
    }

    /// Refetch a single row, e.g. after opening its detail form
    pub async fn reload(&self, id: &EntityId) -> ApiResult<EntityRecord> {
        let result = until_cancelled(&self.lifetime, self.api.get(&self.session, self.resource, id)).await;
        match result {
            Ok(record) => {
                self.rows.upsert(record.clone());
                Ok(record)
            }
            Err(err) => Err(self.report(format!("Could not load {} {}", self.resource, id), err)),
        }
    }

    /// Edit one or more fields of a row; see `FieldUpdateDispatcher::update`
    pub async fn update_fields(
        &self,
        id: &EntityId,
        payload: Map<String, Value>,
    ) -> ApiResult<UpdateOutcome> {
        self.dispatcher.update(&self.session, id, payload).await
    }

    pub async fn update_field(
        &self,
        id: &EntityId,
        field: impl Into<FieldKey>,
        value: impl Into<Value>,
    ) -> ApiResult<UpdateOutcome> {
        self.dispatcher
            .update_field(&self.session, id, field.into(), value.into())
            .await
    }

    /// Create a row and append what the server stored
    pub async fn create(&self, fields: Map<String, Value>) -> ApiResult<EntityRecord> {
        let result = until_cancelled(
            &self.lifetime,
            self.api.create(&self.session, self.resource, &fields),
        )
        .await;
        match result {
            Ok(record) => {
                self.rows.upsert(record.clone());
                self.notices
                    .success(format!("Created {} {}", self.resource, record.id));
                Ok(record)
            }
            Err(err) => Err(self.report(format!("Could not create {}", self.resource), err)),
        }
    }

    /// Delete a row; it leaves the store only once the server confirms
    pub async fn delete(&self, id: &EntityId) -> ApiResult<()> {
        let result = until_cancelled(
            &self.lifetime,
            self.api.delete(&self.session, self.resource, id),
        )
        .await;
        match result {
            Ok(()) => {
                self.rows.remove(id);
                self.notices.success(format!("Deleted {} {}", self.resource, id));
                Ok(())
            }
            Err(err) => Err(self.report(format!("Could not delete {} {}", self.resource, id), err)),
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    /// Rows passing the current filter, in store order
    pub fn displayed(&self) -> Vec<EntityRecord> {
        filter_records(&self.rows.snapshot(), &self.filter)
    }

    pub fn is_loading(&self, id: &EntityId, field: impl Into<FieldKey>) -> bool {
        self.loading.is_loading(id, &field.into())
    }

    /// Tear the view down: cancel in-flight requests and drop the rows
    pub fn unmount(&self) {
        if self.lifetime.is_cancelled() {
            return;
        }
        info!("{}: unmounting", self.resource);
        self.lifetime.cancel();
        self.rows.clear();
    }

    fn report(&self, context: String, err: ApiError) -> ApiError {
        if !err.is_cancelled() {
            self.notices
                .error(format!("{}: {}", context, err.user_message()));
        }
        err
    }
}

impl Drop for TableView {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
