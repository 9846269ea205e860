use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::traits::EndpointProbe;

/// Whole-request bound for every outbound HTTP call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client with a whole-request deadline.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "http client build failed, using defaults");
        Client::new()
    })
}

/// GETs `{base_url}{path}`. Any 2xx counts as reachable.
pub struct HttpEndpointProbe {
    base_url: String,
    client: Client,
}

impl HttpEndpointProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(REQUEST_TIMEOUT),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl EndpointProbe for HttpEndpointProbe {
    async fn ping(&self, path: &str) -> bool {
        match self.client.get(self.url_for(path)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(path, error = %e, "endpoint unreachable");
                false
            }
        }
    }
}
