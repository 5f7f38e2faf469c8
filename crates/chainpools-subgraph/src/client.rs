//! GraphQL-over-HTTP page source backed by `reqwest`.
//!
//! Every page request is paced by a token bucket and transient failures
//! (HTTP errors, timeouts, 429s) are retried with exponential backoff here,
//! below the pagination engine, which never retries on its own.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chainpools_core::error::PoolsError;
use chainpools_core::paginator::{PageRequest, PageSource};
use chainpools_core::types::{Network, SchemaVersion};

use crate::endpoints::{self, DEFAULT_GATEWAY};
use crate::policy::{RateLimiter, RateLimiterConfig, RetryConfig, RetryPolicy};

/// Configuration for [`SubgraphClient`].
#[derive(Debug, Clone)]
pub struct SubgraphClientConfig {
    pub retry: RetryConfig,
    pub rate_limiter: RateLimiterConfig,
    pub request_timeout: Duration,
    /// Gateway base URL, without the `/api/...` suffix.
    pub gateway: String,
}

impl Default for SubgraphClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            request_timeout: Duration::from_secs(30),
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }
}

/// Subgraph client for one endpoint URL.
pub struct SubgraphClient {
    url: String,
    /// `url` with the API key masked, for logs and errors.
    label: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    rate_limiter: RateLimiter,
    request_timeout: Duration,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>, config: SubgraphClientConfig) -> Result<Self, PoolsError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PoolsError::Config(format!("http client: {e}")))?;
        Ok(Self {
            label: url.clone(),
            url,
            http,
            retry: RetryPolicy::new(config.retry),
            rate_limiter: RateLimiter::new(config.rate_limiter),
            request_timeout: config.request_timeout,
        })
    }

    /// Client for the deployed subgraph of a (network, version) target.
    pub fn for_target(
        network: Network,
        version: SchemaVersion,
        api_key: &str,
        config: SubgraphClientConfig,
    ) -> Result<Self, PoolsError> {
        if api_key.trim().is_empty() {
            return Err(PoolsError::Config("subgraph gateway API key is empty".into()));
        }
        let url = endpoints::endpoint_url(&config.gateway, api_key, network, version)?;
        let mut client = Self::new(url, config)?;
        client.label = client.url.replace(api_key, "***");
        Ok(client)
    }

    pub fn endpoint(&self) -> &str {
        &self.label
    }

    async fn send_once(&self, body: &Value) -> Result<Vec<Value>, PoolsError> {
        let resp = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), text, &self.label));
        }

        let body: Value = resp.json().await.map_err(|e| self.transport_error(e))?;
        parse_response(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> PoolsError {
        if e.is_timeout() {
            PoolsError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            PoolsError::MalformedResponse(e.to_string())
        } else {
            // reqwest errors carry the URL, which carries the key.
            PoolsError::Http(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl PageSource for SubgraphClient {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>, PoolsError> {
        let body = request_body(request);
        let mut attempt = 0u32;
        loop {
            self.rate_limiter.acquire().await;
            attempt += 1;
            match self.send_once(&body).await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            endpoint = %self.label,
                            "retrying page request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(attempt, error = %e, endpoint = %self.label, "max retries exceeded");
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}

/// Error for a non-success status. 429 is rate limiting; the rest keep their
/// status so 4xx is not retried.
pub fn status_error(status: u16, body: String, endpoint: &str) -> PoolsError {
    if status == 429 {
        PoolsError::RateLimited {
            endpoint: endpoint.to_string(),
        }
    } else {
        PoolsError::HttpStatus { status, body }
    }
}

/// `{query, variables: {pageSize, filter}}`.
pub fn request_body(request: &PageRequest<'_>) -> Value {
    json!({
        "query": request.query.document,
        "variables": {
            "pageSize": request.page_size,
            "filter": request.filter,
        },
    })
}

/// Extract `data.items` from a GraphQL response.
pub fn parse_response(mut body: Value) -> Result<Vec<Value>, PoolsError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                .collect();
            return Err(PoolsError::Graphql(messages.join("; ")));
        }
    }
    let items = body
        .get_mut("data")
        .and_then(|data| data.get_mut("items"))
        .map(Value::take);
    match items {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(PoolsError::MalformedResponse(format!(
            "items is not a list: {other}"
        ))),
        None => Err(PoolsError::MalformedResponse(
            "response has no data.items".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpools_core::query::PoolsQuery;

    #[test]
    fn body_carries_query_and_variables() {
        let query = PoolsQuery::build(SchemaVersion::V2, Network::EthereumMainnet);
        let request = PageRequest {
            query: &query,
            page_size: 100,
            filter: json!({"createdAtBlockNumber_gte": 0}),
        };
        let body = request_body(&request);
        assert_eq!(body["variables"]["pageSize"], 100);
        assert_eq!(body["variables"]["filter"]["createdAtBlockNumber_gte"], 0);
        assert!(body["query"].as_str().unwrap().contains("pairs("));
    }

    #[test]
    fn items_are_extracted() {
        let items = parse_response(json!({"data": {"items": [{"id": "0x1"}, {"id": "0x2"}]}})).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["id"], "0x2");
    }

    #[test]
    fn graphql_errors_win() {
        let err = parse_response(json!({
            "data": null,
            "errors": [{"message": "bad filter"}, {"message": "timeout"}]
        }))
        .unwrap_err();
        assert!(matches!(err, PoolsError::Graphql(ref m) if m == "bad filter; timeout"));
    }

    #[test]
    fn empty_errors_array_is_ignored() {
        let items = parse_response(json!({"data": {"items": []}, "errors": []})).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn missing_data_is_malformed() {
        assert!(matches!(
            parse_response(json!({})).unwrap_err(),
            PoolsError::MalformedResponse(_)
        ));
        assert!(matches!(
            parse_response(json!({"data": {"items": 3}})).unwrap_err(),
            PoolsError::MalformedResponse(_)
        ));
    }

    #[test]
    fn status_classification() {
        let err = status_error(429, String::new(), "gw");
        assert!(matches!(err, PoolsError::RateLimited { ref endpoint } if endpoint == "gw"));
        assert!(err.is_retryable());

        let err = status_error(401, "auth error: invalid api key".into(), "gw");
        assert!(matches!(err, PoolsError::HttpStatus { status: 401, .. }));
        assert!(!err.is_retryable());

        assert!(status_error(502, "bad gateway".into(), "gw").is_retryable());
    }

    #[test]
    fn target_client_masks_key() {
        let client = SubgraphClient::for_target(
            Network::EthereumMainnet,
            SchemaVersion::V3,
            "secret-key",
            SubgraphClientConfig::default(),
        )
        .unwrap();
        assert!(!client.endpoint().contains("secret-key"));
        assert!(client.endpoint().contains("/api/***/subgraphs/id/"));
    }

    #[test]
    fn empty_key_is_config_error() {
        let err = SubgraphClient::for_target(
            Network::EthereumMainnet,
            SchemaVersion::V3,
            " ",
            SubgraphClientConfig::default(),
        )
        .err()
        .unwrap();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_http_error() {
        let client = SubgraphClient::new(
            "http://127.0.0.1:9/graphql",
            SubgraphClientConfig {
                retry: RetryConfig::none(),
                request_timeout: Duration::from_secs(2),
                ..Default::default()
            },
        )
        .unwrap();
        let query = PoolsQuery::build(SchemaVersion::V2, Network::EthereumMainnet);
        let request = PageRequest {
            query: &query,
            page_size: 1,
            filter: json!({}),
        };
        let err = client.fetch_page(&request).await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error {err:?}");
    }
}
