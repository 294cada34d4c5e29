//! Datadog API client implementation.
//!
//! This module provides the HTTP client for the monitor, dashboard and SLO
//! endpoints of the Datadog v1 API.

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{ApiError, KennelError, Result};
use crate::resource::{ActualRecord, RemoteId, ResourceKind, parse_marker};

use super::store::MonitoringApi;
use super::types::{DashboardList, ErrorBody, SloEnvelope, SloItem};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.datadoghq.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Datadog API client.
#[derive(Debug, Clone)]
pub struct DatadogClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// API key.
    api_key: String,
    /// Application key.
    app_key: String,
}

impl DatadogClient {
    /// Creates a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, api_key: &str, app_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
        })
    }

    /// Sends a single request and returns the decoded JSON body.
    async fn request(&self, method: Method, path: &str, body: Option<&Map<String, Value>>) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("{method} {path} failed: {e}")))?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(KennelError::Api(ApiError::AuthenticationFailed {
                message: String::from("Invalid API or application key"),
            }));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.errors.join("; "))
                .unwrap_or(text);
            return Err(KennelError::Api(ApiError::request_failed(
                status.as_u16(),
                format!("{method} {path}: {message}"),
            )));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            KennelError::Api(ApiError::InvalidResponse {
                message: format!("Failed to parse response of {method} {path}: {e}"),
            })
        })
    }

    fn collection_path(kind: ResourceKind) -> String {
        format!("/api/v1/{}", kind.api_resource())
    }

    fn item_path(kind: ResourceKind, id: &RemoteId) -> String {
        format!("/api/v1/{}/{id}", kind.api_resource())
    }

    /// Lists dashboards, fetching managed ones in full.
    ///
    /// The list endpoint only returns summaries; widgets are needed to diff.
    async fn list_dashboards(&self) -> Result<Vec<Map<String, Value>>> {
        let list: DashboardList = decode(
            self.request(Method::GET, &Self::collection_path(ResourceKind::Dashboard), None)
                .await?,
        )?;

        let mut dashboards = Vec::with_capacity(list.dashboards.len());
        for summary in list.dashboards {
            let managed = summary
                .get("description")
                .and_then(Value::as_str)
                .and_then(parse_marker)
                .is_some();
            let id = summary.get("id").and_then(RemoteId::from_value);
            match id {
                Some(id) if managed => {
                    let full = self
                        .request(Method::GET, &Self::item_path(ResourceKind::Dashboard, &id), None)
                        .await?;
                    dashboards.push(decode(full)?);
                }
                _ => dashboards.push(summary),
            }
        }
        Ok(dashboards)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        KennelError::Api(ApiError::InvalidResponse {
            message: format!("Unexpected response shape: {e}"),
        })
    })
}

#[async_trait]
impl MonitoringApi for DatadogClient {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<ActualRecord>> {
        let objects: Vec<Map<String, Value>> = match kind {
            ResourceKind::Monitor => {
                decode(self.request(Method::GET, &Self::collection_path(kind), None).await?)?
            }
            ResourceKind::Dashboard => self.list_dashboards().await?,
            ResourceKind::Slo => {
                let envelope: SloEnvelope =
                    decode(self.request(Method::GET, &Self::collection_path(kind), None).await?)?;
                envelope.data
            }
        };

        let records: Vec<ActualRecord> = objects
            .into_iter()
            .filter_map(|attributes| ActualRecord::from_api(kind, attributes))
            .collect();
        debug!("Listed {} {kind} resources", records.len());
        Ok(records)
    }

    async fn get(&self, kind: ResourceKind, id: &RemoteId) -> Result<ActualRecord> {
        let reply = self
            .request(Method::GET, &Self::item_path(kind, id), None)
            .await?;
        let object: Map<String, Value> = match kind {
            ResourceKind::Slo => {
                let item: SloItem = decode(reply)?;
                item.data
            }
            ResourceKind::Monitor | ResourceKind::Dashboard => decode(reply)?,
        };
        ActualRecord::from_api(kind, object).ok_or_else(|| {
            KennelError::Api(ApiError::InvalidResponse {
                message: format!("{kind} {id} was returned without an id"),
            })
        })
    }

    async fn create(
        &self,
        kind: ResourceKind,
        attributes: &Map<String, Value>,
    ) -> Result<RemoteId> {
        let reply = self
            .request(Method::POST, &Self::collection_path(kind), Some(attributes))
            .await?;
        let created = match kind {
            ResourceKind::Slo => {
                let envelope: SloEnvelope = decode(reply)?;
                envelope.data.into_iter().next().unwrap_or_default()
            }
            ResourceKind::Monitor | ResourceKind::Dashboard => decode(reply)?,
        };
        created
            .get("id")
            .and_then(RemoteId::from_value)
            .ok_or_else(|| {
                KennelError::Api(ApiError::InvalidResponse {
                    message: format!("Created {kind} without an id"),
                })
            })
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &RemoteId,
        attributes: &Map<String, Value>,
    ) -> Result<()> {
        self.request(Method::PUT, &Self::item_path(kind, id), Some(attributes))
            .await?;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: &RemoteId) -> Result<()> {
        self.request(Method::DELETE, &Self::item_path(kind, id), None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::marker;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> DatadogClient {
        DatadogClient::new(&server.uri(), "api", "app").expect("client")
    }

    #[tokio::test]
    async fn test_list_monitors_reads_markers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/monitor"))
            .and(header("DD-API-KEY", "api"))
            .and(header("DD-APPLICATION-KEY", "app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "managed", "message": format!("hi\n{}", marker("p:m")) },
                { "id": 2, "name": "manual", "message": "hi" },
            ])))
            .mount(&server)
            .await;

        let records = client(&server).await.list(ResourceKind::Monitor).await.expect("list");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tracking_id.as_deref(), Some("p:m"));
        assert_eq!(records[0].id.as_str(), "1");
        assert_eq!(records[1].tracking_id, None);
    }

    #[tokio::test]
    async fn test_list_dashboards_fetches_managed_in_full() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dashboards": [
                { "id": "abc", "title": "t", "description": marker("p:d") },
                { "id": "xyz", "title": "other", "description": null },
            ] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dashboard/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "abc", "title": "t", "description": marker("p:d"), "widgets": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client(&server).await.list(ResourceKind::Dashboard).await.expect("list");
        assert_eq!(records.len(), 2);
        assert!(records[0].attributes.contains_key("widgets"));
        assert!(!records[1].attributes.contains_key("widgets"));
    }

    #[tokio::test]
    async fn test_get_reads_full_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dashboard/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "xyz", "title": "other", "widgets": [{ "definition": { "type": "note" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/slo/s1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "id": "s1", "name": "s" } })),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let dashboard = client
            .get(ResourceKind::Dashboard, &RemoteId::from("xyz"))
            .await
            .expect("get");
        assert_eq!(dashboard.id.as_str(), "xyz");
        assert!(dashboard.attributes.contains_key("widgets"));
        assert_eq!(dashboard.tracking_id, None);

        let slo = client
            .get(ResourceKind::Slo, &RemoteId::from("s1"))
            .await
            .expect("get");
        assert_eq!(slo.attributes["name"], json!("s"));
    }

    #[tokio::test]
    async fn test_create_slo_reads_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/slo"))
            .and(body_json(json!({ "name": "s" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": "s1" }] })),
            )
            .mount(&server)
            .await;

        let attrs = json!({ "name": "s" }).as_object().cloned().unwrap_or_default();
        let id = client(&server)
            .await
            .create(ResourceKind::Slo, &attrs)
            .await
            .expect("create");
        assert_eq!(id.as_str(), "s1");
    }

    #[tokio::test]
    async fn test_failed_update_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/monitor/5"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "errors": ["bad query"] })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .update(ResourceKind::Monitor, &RemoteId::from("5"), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KennelError::Api(ApiError::RequestFailed { status: 400, ref message }) if message.contains("bad query")
        ));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/dashboard/abc"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = client(&server)
            .await
            .delete(ResourceKind::Dashboard, &RemoteId::from("abc"))
            .await;
        tokio_test::assert_err!(result);
    }
}
