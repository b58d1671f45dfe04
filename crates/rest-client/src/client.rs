//! `reqwest`-backed transport.

use crate::error::RestError;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// REST client executing requests over HTTPS.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout, covering connect and body read
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::RequestBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for RestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError> {
        tracing::debug!(method = %request.method, path = %request.path, "HTTP request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.text().await?;

        tracing::debug!(path = %request.path, status, "HTTP response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
