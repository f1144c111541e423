//! reqwest-backed [`Fetcher`].

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use super::{FetchResponse, Fetcher};
use crate::cache::RequestOptions;
use crate::error::FetchError;

/// Sends the request as described by [`RequestOptions`] and decodes the
/// response body as JSON.
///
/// Retries, redirects and auth are left to the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<FetchResponse, FetchError> {
        let method = Method::from_bytes(options.method().as_bytes())
            .map_err(|e| FetchError::InvalidRequest(format!("method {}: {e}", options.method())))?;

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
            request = request.header(name, value);
        }
        if let Some(body) = options.body.as_ref().filter(|b| !b.is_null()) {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!(url, status, len = bytes.len(), "Upstream responded");

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?
        };

        Ok(FetchResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_method_is_rejected_before_sending() {
        let fetcher = HttpFetcher::new();
        let options = RequestOptions::new().with_method("BAD METHOD");

        let result = fetcher.fetch("http://127.0.0.1:1/", &options).await;
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalid_header_is_rejected() {
        let fetcher = HttpFetcher::new();
        let options = RequestOptions::new().with_header("bad header", "x");

        let result = fetcher.fetch("http://127.0.0.1:1/", &options).await;
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let fetcher = HttpFetcher::new();

        // Port 1 is reserved and nothing listens on it
        let result = fetcher.fetch("http://127.0.0.1:1/", &RequestOptions::new()).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
