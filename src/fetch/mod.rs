use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use crate::config::HttpConfig;
use crate::{AcquireResult, TranscriptError};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Outbound network capability used by every strategy
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issue a GET request and read the whole body
    async fn get(&self, url: &str) -> AcquireResult<HttpResponse>;

    /// POST a JSON document and read the whole body
    async fn post_json(&self, url: &str, body: &Value) -> AcquireResult<HttpResponse>;
}

/// `HttpFetcher` backed by a shared reqwest client
#[derive(Debug)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> AcquireResult<Self> {
        let mut headers = HeaderMap::new();
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| TranscriptError::Network(format!("Invalid header value: {}", e)))
        };
        headers.insert(USER_AGENT, header(&config.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, header(&config.accept_language)?);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(network_error)?;

        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> AcquireResult<HttpResponse> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        Ok(HttpResponse { status, body })
    }
}

fn network_error(err: reqwest::Error) -> TranscriptError {
    TranscriptError::Network(err.to_string())
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> AcquireResult<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(network_error)?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> AcquireResult<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_response_status_classes() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::new(429, "slow down").is_success());
    }

    #[test]
    fn test_blank_body() {
        assert!(HttpResponse::new(200, "  \n\t").is_blank());
        assert!(!HttpResponse::new(200, "<transcript/>").is_blank());
    }

    #[test]
    fn test_fetcher_builds_from_default_config() {
        assert_ok!(ReqwestFetcher::new(&HttpConfig::default()));
    }

    #[test]
    fn test_fetcher_rejects_invalid_header_values() {
        let config = HttpConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpConfig::default()
        };
        assert_err!(ReqwestFetcher::new(&config));
    }
}
