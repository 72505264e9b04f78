//! HTTP implementation of [`MonitorApi`] backed by reqwest.
//!
//! ## Example
//!
//! ```rust,no_run
//! use probewatch::api::{ApiClient, MonitorApi};
//!
//! # tokio_test::block_on(async {
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8080/api")
//!     .token("secret")
//!     .build()
//!     .unwrap();
//!
//! let monitors = client.public_monitors().await.unwrap();
//! println!("{} monitors", monitors.len());
//! # });
//! ```

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    AggregatedMonitorMetric, ListQuery, MetricsConfig, MonitorStats, MonitorTask,
    MonitorTaskRequest, Page, PublicMonitor, TimeRange,
};
use super::{ApiError, MonitorApi};

/// Characters left unescaped in a path segment, matching `encodeURIComponent`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const METRICS_CONFIG_PATH: &str = "/admin/properties/metrics_config";

/// Client for the monitoring API.
///
/// No retries and no request timeout: a failed or hung request is left
/// to the next scheduled poll.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        decode(response).await
    }

    /// GET a collection where an empty or `null` body means "no items".
    async fn get_list<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        decode_or_default(response).await
    }
}

#[async_trait]
impl MonitorApi for ApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn public_monitors(&self) -> Result<Vec<PublicMonitor>, ApiError> {
        self.get_list("/monitors").await
    }

    async fn monitor_stats(&self, name: &str) -> Result<Vec<MonitorStats>, ApiError> {
        self.get_list(&format!("/monitors/{}/stats", encode_segment(name))).await
    }

    async fn monitor_history(
        &self,
        name: &str,
        range: TimeRange,
    ) -> Result<Vec<AggregatedMonitorMetric>, ApiError> {
        self.get_list(&format!(
            "/monitors/{}/history?range={}",
            encode_segment(name),
            range.token()
        ))
        .await
    }

    async fn list_monitors(&self, query: &ListQuery) -> Result<Page<MonitorTask>, ApiError> {
        let url = self.url("/admin/monitors");
        let mut params = vec![
            ("page", query.page.to_string()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            params.push(("keyword", keyword.to_string()));
        }
        debug!(%url, ?params, "GET");

        let response = self.send(self.client.get(&url).query(&params)).await?;
        decode_or_default(response).await
    }

    async fn get_monitor(&self, id: &str) -> Result<MonitorTask, ApiError> {
        self.get_json(&format!("/admin/monitors/{}", encode_segment(id))).await
    }

    async fn create_monitor(&self, request: &MonitorTaskRequest) -> Result<MonitorTask, ApiError> {
        let url = self.url("/admin/monitors");
        debug!(%url, name = %request.name, "POST");
        let response = self.send(self.client.post(&url).json(request)).await?;
        decode(response).await
    }

    async fn update_monitor(
        &self,
        id: &str,
        request: &MonitorTaskRequest,
    ) -> Result<MonitorTask, ApiError> {
        let url = self.url(&format!("/admin/monitors/{}", encode_segment(id)));
        debug!(%url, name = %request.name, "PUT");
        let response = self.send(self.client.put(&url).json(request)).await?;
        decode(response).await
    }

    async fn delete_monitor(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/admin/monitors/{}", encode_segment(id)));
        debug!(%url, "DELETE");
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn metrics_config(&self) -> Result<MetricsConfig, ApiError> {
        self.get_json(METRICS_CONFIG_PATH).await
    }

    async fn save_metrics_config(&self, config: &MetricsConfig) -> Result<(), ApiError> {
        let url = self.url(METRICS_CONFIG_PATH);
        debug!(%url, ?config, "PUT");
        self.send(self.client.put(&url).json(config)).await?;
        Ok(())
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
}

impl ApiClientBuilder {
    /// Set the API base URL (e.g., "http://localhost:8080/api").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a bearer token sent with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:8080/api".to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let client = Client::builder()
            .user_agent(concat!("probewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ApiClient {
            client,
            base_url,
            token: self.token.filter(|t| !t.is_empty()),
        })
    }
}

/// Percent-encode an identifier for use as a single path segment.
pub fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT).to_string()
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.trim().to_string()
    };

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Http {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn decode_or_default<T: DeserializeOwned + Default>(
    response: Response,
) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    let body = std::str::from_utf8(&bytes).map_err(|e| ApiError::Parse(e.to_string()))?;
    match body.trim() {
        "" | "null" => Ok(T::default()),
        trimmed => Ok(serde_json::from_str(trimmed)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/", addr)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::builder().base_url(base_url).build().unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_builder_rejects_non_http_url() {
        let err = ApiClient::builder().base_url("ftp://example.com").build().unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("simple"), "simple");
        assert_eq!(encode_segment("web api/v2"), "web%20api%2Fv2");
        assert_eq!(encode_segment("a?b#c"), "a%3Fb%23c");
        assert_eq!(encode_segment("it's-ok_(1).~*!"), "it's-ok_(1).~*!");
    }

    #[tokio::test]
    async fn test_public_monitors() {
        let router = Router::new().route(
            "/api/monitors",
            get(|| async {
                Json(json!([
                    {"id": "1", "name": "api", "status": "up", "responseTime": 100},
                    {"id": "2", "name": "db", "status": "down", "responseTime": 300}
                ]))
            }),
        );
        let base = serve(router).await;

        let monitors = client(&base).public_monitors().await.unwrap();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[1].name, "db");
    }

    #[tokio::test]
    async fn test_null_list_is_empty() {
        let router = Router::new().route("/api/monitors", get(|| async { Json(Value::Null) }));
        let base = serve(router).await;

        let monitors = client(&base).public_monitors().await.unwrap();
        assert!(monitors.is_empty());
    }

    #[tokio::test]
    async fn test_stats_path_is_percent_encoded() {
        let router = Router::new().route(
            "/api/monitors/{name}/stats",
            get(|Path(name): Path<String>| async move {
                Json(json!([{"agentId": "a1", "monitorName": name}]))
            }),
        );
        let base = serve(router).await;

        let stats = client(&base).monitor_stats("web api/v2").await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].monitor_name, "web api/v2");
    }

    #[tokio::test]
    async fn test_history_sends_range_token() {
        let router = Router::new().route(
            "/api/monitors/{name}/history",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let range = params.get("range").cloned().unwrap_or_default();
                Json(json!([{"timestamp": 1, "agentId": range, "avgResponse": 5}]))
            }),
        );
        let base = serve(router).await;

        let history = client(&base)
            .monitor_history("api", TimeRange::ThirtyMinutes)
            .await
            .unwrap();
        assert_eq!(history[0].agent_id, "30m");
    }

    #[tokio::test]
    async fn test_list_monitors_pagination_params() {
        let router = Router::new().route(
            "/api/admin/monitors",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "items": [{
                        "id": "x",
                        "name": format!("{}-{}", params["page"], params["pageSize"]),
                        "type": "tcp",
                        "target": params.get("keyword").cloned().unwrap_or_default()
                    }],
                    "total": 21
                }))
            }),
        );
        let base = serve(router).await;
        let client = client(&base);

        let page = client
            .list_monitors(&ListQuery {
                page: 3,
                page_size: 10,
                keyword: Some("  redis ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 21);
        assert_eq!(page.items[0].name, "3-10");
        assert_eq!(page.items[0].target, "redis");

        let page = client
            .list_monitors(&ListQuery {
                keyword: Some("   ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items[0].target, "");
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let router = Router::new().route(
            "/api/admin/properties/metrics_config",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer secret") => {
                        Ok(Json(json!({"retentionHours": 48, "maxQueryPoints": 500})))
                    }
                    _ => Err(AxumStatus::UNAUTHORIZED),
                }
            }),
        );
        let base = serve(router).await;

        let err = client(&base).metrics_config().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let authed = ApiClient::builder().base_url(&base).token("secret").build().unwrap();
        let config = authed.metrics_config().await.unwrap();
        assert_eq!(config.retention_hours, 48);
        assert_eq!(config.max_query_points, 500);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = Router::new()
            .route(
                "/api/admin/monitors/{id}",
                get(|| async { (AxumStatus::NOT_FOUND, "monitor missing") }),
            )
            .route(
                "/api/monitors",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "") }),
            );
        let base = serve(router).await;
        let client = client(&base);

        let err = client.get_monitor("nope").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("monitor missing".to_string()));

        let err = client.public_monitors().await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr)).public_monitors().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let router = Router::new()
            .route(
                "/api/admin/monitors",
                axum::routing::post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "id": "new-id",
                        "name": body["name"],
                        "type": body["type"],
                        "target": body["target"],
                        "interval": 60
                    }))
                }),
            )
            .route(
                "/api/admin/monitors/{id}",
                axum::routing::delete(|Path(id): Path<String>| async move {
                    if id == "new-id" {
                        AxumStatus::OK
                    } else {
                        AxumStatus::NOT_FOUND
                    }
                }),
            );
        let base = serve(router).await;
        let client = client(&base);

        let request = MonitorTaskRequest {
            name: "cache".to_string(),
            monitor_type: crate::api::MonitorType::Tcp,
            target: "cache.internal:6379".to_string(),
            ..Default::default()
        };
        let created = client.create_monitor(&request).await.unwrap();
        assert_eq!(created.id, "new-id");
        assert_eq!(created.target, "cache.internal:6379");
        assert_eq!(created.interval, 60);

        client.delete_monitor("new-id").await.unwrap();
        assert!(client.delete_monitor("other").await.is_err());
    }

    #[tokio::test]
    async fn test_save_metrics_config_puts_camel_case_body() {
        let router = Router::new().route(
            "/api/admin/properties/metrics_config",
            axum::routing::put(|Json(body): Json<Value>| async move {
                if body == json!({"retentionHours": 72, "maxQueryPoints": 300}) {
                    AxumStatus::NO_CONTENT
                } else {
                    AxumStatus::BAD_REQUEST
                }
            }),
        );
        let base = serve(router).await;

        let config = MetricsConfig {
            retention_hours: 72,
            max_query_points: 300,
        };
        client(&base).save_metrics_config(&config).await.unwrap();

        let wrong = MetricsConfig {
            retention_hours: 24,
            ..config
        };
        let err = client(&base).save_metrics_config(&wrong).await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 400, .. }));
    }
}
