use crate::api::ApiResult;
use crate::model::{EntityId, EntityRecord, Resource, Session};
use serde_json::{Map, Value};

/// Transport seam between list views and the course API.
///
/// `ApiClient` is the HTTP implementation; views only see this trait.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// `GET /{resource}`
    async fn list(&self, session: &Session, resource: Resource) -> ApiResult<Vec<EntityRecord>>;

    /// `GET /{resource}/{id}`
    async fn get(
        &self,
        session: &Session,
        resource: Resource,
        id: &EntityId,
    ) -> ApiResult<EntityRecord>;

    /// `POST /{resource}`, returns the stored row
    async fn create(
        &self,
        session: &Session,
        resource: Resource,
        body: &Map<String, Value>,
    ) -> ApiResult<EntityRecord>;

    /// `PATCH /{resource}/{id}` with only the changed fields; returns the envelope `data`
    async fn patch(
        &self,
        session: &Session,
        resource: Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> ApiResult<Option<Value>>;

    /// `DELETE /{resource}/{id}`
    async fn delete(&self, session: &Session, resource: Resource, id: &EntityId) -> ApiResult<()>;
}
