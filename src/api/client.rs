use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{Map, Value};

use crate::api::{ApiError, ApiResult, RemoteApi};
use crate::config::ApiConfig;
use crate::model::{generate_request_id, EntityId, EntityRecord, Envelope, Resource, Session};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for the course API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("invalid api.base_url '{}': {}", config.base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("api.base_url '{}' cannot be used as a base URL", config.base_url);
        }

        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{resource}` or `{base}/{resource}/{id}` with the id percent-encoded
    fn url(&self, resource: Resource, id: Option<&EntityId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource.path());
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        url
    }

    fn request(&self, session: &Session, method: Method, url: Url) -> ApiResult<RequestBuilder> {
        if !session.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }

        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, session.bearer())
            .header(REQUEST_ID_HEADER, generate_request_id()))
    }

    /// Send a request and unwrap the envelope.
    ///
    /// Transport failures, non-2xx statuses and `success: false` all end up as
    /// an `ApiError`; a successful envelope yields its `data`.
    async fn send(&self, request: RequestBuilder) -> ApiResult<Option<Value>> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{} {}", method, url);

        let response = self.http.execute(request).await.map_err(|e| {
            warn!("{} {} failed: {}", method, url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.reason().map(str::to_string))
                .unwrap_or_else(|| body.trim().chars().take(200).collect());
            warn!("{} {} returned {}: {}", method, url, status, message);
            return Err(ApiError::Status { status, message });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        envelope.into_data().map_err(|reason| {
            warn!("{} {} rejected: {}", method, url, reason);
            ApiError::Rejected(reason)
        })
    }
}

fn records_from(data: Option<Value>) -> ApiResult<Vec<EntityRecord>> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => rows
            .into_iter()
            .map(|row| EntityRecord::try_from(row).map_err(ApiError::from))
            .collect(),
        Some(other) => Err(ApiError::Decode(format!(
            "expected a list of rows, got {}",
            other
        ))),
    }
}

fn record_from(data: Option<Value>) -> ApiResult<EntityRecord> {
    match data {
        Some(value) => Ok(EntityRecord::try_from(value)?),
        None => Err(ApiError::Decode("response carried no data".to_string())),
    }
}

#[async_trait::async_trait]
impl RemoteApi for ApiClient {
    async fn list(&self, session: &Session, resource: Resource) -> ApiResult<Vec<EntityRecord>> {
        let request = self.request(session, Method::GET, self.url(resource, None))?;
        records_from(self.send(request).await?)
    }

    async fn get(
        &self,
        session: &Session,
        resource: Resource,
        id: &EntityId,
    ) -> ApiResult<EntityRecord> {
        let request = self.request(session, Method::GET, self.url(resource, Some(id)))?;
        record_from(self.send(request).await?)
    }

    async fn create(
        &self,
        session: &Session,
        resource: Resource,
        body: &Map<String, Value>,
    ) -> ApiResult<EntityRecord> {
        let request = self
            .request(session, Method::POST, self.url(resource, None))?
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        record_from(self.send(request).await?)
    }

    async fn patch(
        &self,
        session: &Session,
        resource: Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> ApiResult<Option<Value>> {
        let request = self
            .request(session, Method::PATCH, self.url(resource, Some(id)))?
            .header(CONTENT_TYPE, "application/json")
            .json(payload);
        self.send(request).await
    }

    async fn delete(&self, session: &Session, resource: Resource, id: &EntityId) -> ApiResult<()> {
        let request = self.request(session, Method::DELETE, self.url(resource, Some(id)))?;
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let api = client("https://api.example.com/v1/");
        assert_eq!(
            api.url(Resource::Enrollments, Some(&EntityId::Num(42))).as_str(),
            "https://api.example.com/v1/enrollments/42"
        );
        assert_eq!(
            api.url(Resource::Admins, Some(&EntityId::from("a b"))).as_str(),
            "https://api.example.com/v1/admins/a%20b"
        );

        let api = client("http://127.0.0.1:9000");
        assert_eq!(
            api.url(Resource::Locations, None).as_str(),
            "http://127.0.0.1:9000/locations"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::new(&ApiConfig {
            base_url: "not a url".to_string(),
            timeout_secs: 5,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_request_without_token_is_rejected() {
        let api = client("http://127.0.0.1:9000");
        let url = api.url(Resource::Students, None);
        let err = api.request(&Session::new(""), Method::GET, url).unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[test]
    fn test_records_from_list_payload() {
        let rows = records_from(Some(json!([{"id": 1}, {"id": "x", "name": "B"}]))).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text("name"), Some("B"));

        assert!(records_from(None).unwrap().is_empty());
        assert!(records_from(Some(json!({"id": 1}))).is_err());
        assert!(records_from(Some(json!([{"name": "no id"}]))).is_err());
    }
}
