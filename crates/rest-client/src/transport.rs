//! Transport abstraction between the request pipeline and the network.

use crate::error::RestError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// HTTP methods used by read-only endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A fully built request: URL with encoded query plus headers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Build a request from a base URL, a path and an optional query string
    /// (without leading '?').
    pub fn new(method: HttpMethod, base_url: &str, path: &str, query: Option<String>) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = match query.as_deref() {
            Some(q) if !q.is_empty() => format!("{}{}?{}", base, path, q),
            _ => format!("{}{}", base, path),
        };

        Self {
            method,
            url,
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()),
            headers: Vec::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of a query parameter, if present (raw, still URL-encoded).
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
    }
}

/// Raw HTTP response. Header names are lowercase.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Build a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header (name is lowercased).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes exactly one HTTP exchange per call.
///
/// Implementations must not retry; retry policy belongs to the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_no_query() {
        let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com", "/api/v1/time", None);
        assert_eq!(request.url, "https://api.example.com/api/v1/time");
        assert!(request.query.is_none());
    }

    #[test]
    fn test_request_url_with_query() {
        let request = HttpRequest::new(
            HttpMethod::Get,
            "https://api.example.com",
            "/api/v1/ticker",
            Some("symbol=BTCUSDT&limit=5".into()),
        );
        assert_eq!(
            request.url,
            "https://api.example.com/api/v1/ticker?symbol=BTCUSDT&limit=5"
        );
        assert_eq!(request.query_param("limit"), Some("5"));
        assert_eq!(request.query_param("signature"), None);
    }

    #[test]
    fn test_request_url_strips_trailing_slash() {
        let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/", "/api/v1/time", None);
        assert_eq!(request.url, "https://api.example.com/api/v1/time");
    }

    #[test]
    fn test_request_url_empty_query() {
        let request = HttpRequest::new(
            HttpMethod::Get,
            "https://api.example.com",
            "/api/v1/time",
            Some(String::new()),
        );
        assert_eq!(request.url, "https://api.example.com/api/v1/time");
        assert!(request.query.is_none());
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "{}").with_header("X-MBX-USED-WEIGHT-1M", "42");
        assert_eq!(response.header("x-mbx-used-weight-1m"), Some("42"));
        assert_eq!(response.header("X-Mbx-Used-Weight-1m"), Some("42"));
        assert!(response.is_success());
    }
}
