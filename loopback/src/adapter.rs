//! REST adapter following Loopback URL and filter conventions.

use crate::config::{ConfigError, LoopbackConfig};
use crud_store_core::adapter::{AdapterFuture, CleanBody, RequestAdapter, strip_id, to_object};
use crud_store_core::error::AdapterError;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::record::{CountResponse, DeleteResponse, PartialRecord, Record, RecordId};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::Instrument;

/// Adapter for one Loopback REST collection.
///
/// | Operation | Request |
/// |---|---|
/// | `get_all` | `GET {url}?filter=<json>` |
/// | `count` | `GET {url}/count?where=<json>` |
/// | `get_by_id` | `GET {url}/{id}?filter=<json>` |
/// | `create` | `POST {url}` |
/// | `update` | `PATCH {url}/{id}` |
/// | `delete` | `DELETE {url}/{id}` |
///
/// Create and update bodies go through the cleaner first; the default
/// cleaner strips `id`.
///
/// # Example
///
/// ```no_run
/// use crud_store_core::adapter::RequestAdapter;
/// use crud_store_loopback::{LoopbackAdapter, LoopbackConfig};
/// use serde_json::Value;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let users = LoopbackAdapter::<Value>::new(LoopbackConfig::new("http://localhost:3000/api/users"))?;
/// let all = users.get_all(None).await?;
/// # Ok(())
/// # }
/// ```
pub struct LoopbackAdapter<T> {
    client: Client,
    base_url: Url,
    clean_body: CleanBody,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for LoopbackAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            clean_body: Arc::clone(&self.clean_body),
            _record: PhantomData,
        }
    }
}

impl<T: Record> LoopbackAdapter<T> {
    /// Build an adapter and its HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the base URL or a header is invalid, or if
    /// the HTTP client cannot be built.
    pub fn new(config: LoopbackConfig) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(header_map(&config.headers)?)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            clean_body: Arc::new(strip_id),
            _record: PhantomData,
        })
    }

    /// Build an adapter for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// See [`LoopbackAdapter::new`].
    pub fn from_url(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(LoopbackConfig::new(base_url))
    }

    /// Replace the body cleaner applied before create and update
    #[must_use]
    pub fn with_cleaner<C>(mut self, cleaner: C) -> Self
    where
        C: Fn(PartialRecord) -> PartialRecord + Send + Sync + 'static,
    {
        self.clean_body = Arc::new(cleaner);
        self
    }

    /// The collection URL
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn member_url(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url rejects URLs that cannot take segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, AdapterError> {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Loopback request rejected");
        Err(AdapterError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn fetch_json<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<R, AdapterError> {
        self.execute(request)
            .await?
            .json::<R>()
            .await
            .map_err(|e| AdapterError::Decode(e.to_string()))
    }

    fn cleaned(&self, body: PartialRecord) -> PartialRecord {
        (self.clean_body)(body)
    }

    async fn list(&self, filter: Option<LoopbackFilter>) -> Result<Vec<T>, AdapterError> {
        let mut request = self.client.get(self.base_url.clone());
        if let Some(filter) = &filter {
            request = request.query(&[("filter", encode(filter)?)]);
        }
        let records: Vec<T> = self.fetch_json(request).await?;
        tracing::debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn count_where(
        &self,
        url: Url,
        filter: Option<LoopbackFilter>,
    ) -> Result<CountResponse, AdapterError> {
        let mut request = self.client.get(url);
        if let Some(clause) = filter.and_then(|f| f.where_clause) {
            request = request.query(&[("where", encode(&clause)?)]);
        }
        self.fetch_json(request).await
    }

    async fn find_by_id(
        &self,
        url: Url,
        filter: Option<LoopbackFilter>,
    ) -> Result<T, AdapterError> {
        let mut request = self.client.get(url);
        if let Some(filter) = &filter {
            request = request.query(&[("filter", encode(filter)?)]);
        }
        self.fetch_json(request).await
    }

    async fn post(&self, body: T) -> Result<T, AdapterError> {
        let body = self.cleaned(to_object(&body)?);
        self.fetch_json(self.client.post(self.base_url.clone()).json(&body))
            .await
    }

    async fn patch(&self, url: Url, patch: PartialRecord) -> Result<T, AdapterError> {
        let body = self.cleaned(patch);
        self.fetch_json(self.client.patch(url).json(&body)).await
    }

    async fn remove(&self, url: Url, id: RecordId) -> Result<DeleteResponse, AdapterError> {
        // The response body varies between servers; only the status counts
        self.execute(self.client.delete(url)).await?;
        Ok(DeleteResponse { id })
    }
}

impl<T: Record> RequestAdapter<T> for LoopbackAdapter<T> {
    type Filter = LoopbackFilter;

    fn get_all(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, Vec<T>> {
        let span = tracing::debug_span!("loopback.get_all", url = %self.base_url);
        Box::pin(self.list(filter).instrument(span))
    }

    fn count(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, CountResponse> {
        let url = self.member_url("count");
        let span = tracing::debug_span!("loopback.count", %url);
        Box::pin(self.count_where(url, filter).instrument(span))
    }

    fn get_by_id(&self, id: RecordId, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, T> {
        let url = self.member_url(&id.to_string());
        let span = tracing::debug_span!("loopback.get_by_id", %url);
        Box::pin(self.find_by_id(url, filter).instrument(span))
    }

    fn create(&self, body: T) -> AdapterFuture<'_, T> {
        let span = tracing::debug_span!("loopback.create", url = %self.base_url);
        Box::pin(self.post(body).instrument(span))
    }

    fn update(&self, id: RecordId, patch: PartialRecord) -> AdapterFuture<'_, T> {
        let url = self.member_url(&id.to_string());
        let span = tracing::debug_span!("loopback.update", %url);
        Box::pin(self.patch(url, patch).instrument(span))
    }

    fn delete(&self, id: RecordId) -> AdapterFuture<'_, DeleteResponse> {
        let url = self.member_url(&id.to_string());
        let span = tracing::debug_span!("loopback.delete", %url);
        Box::pin(self.remove(url, id).instrument(span))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "cannot be a base".to_string(),
        });
    }
    Ok(url)
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn encode<S: serde::Serialize>(value: &S) -> Result<String, AdapterError> {
    serde_json::to_string(value)
        .map_err(|e| AdapterError::Request(format!("cannot encode query: {e}")))
}

/// Loopback wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn member_urls_append_one_segment() {
        let adapter = LoopbackAdapter::<Value>::from_url("http://localhost:3000/api/users").unwrap();
        assert_eq!(
            adapter.member_url("count").as_str(),
            "http://localhost:3000/api/users/count"
        );
        assert_eq!(
            adapter.member_url("a b").as_str(),
            "http://localhost:3000/api/users/a%20b"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            LoopbackAdapter::<Value>::from_url("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            LoopbackAdapter::<Value>::from_url("mailto:someone@example.com"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn rejects_invalid_headers() {
        let config = LoopbackConfig::new("http://localhost").with_header("bad header", "x");
        assert_eq!(
            LoopbackAdapter::<Value>::new(config).err(),
            Some(ConfigError::InvalidHeader("bad header".into()))
        );
    }

    #[test]
    fn error_message_prefers_loopback_envelope() {
        assert_eq!(
            error_message(r#"{"error": {"statusCode": 404, "message": "Unknown user"}}"#),
            "Unknown user"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
