//! Scripted transport for exercising the client without a network.

use crate::client::BinanceRestClient;
use crate::config::{ClientConfig, RetryConfig};
use async_trait::async_trait;
use auth::ApiCredentials;
use parking_lot::Mutex;
use rest_client::{HttpRequest, HttpResponse, HttpTransport, RestError};
use std::sync::Arc;
use std::time::Duration;

pub(crate) enum StubReply {
    Respond(HttpResponse),
    Fail(RestError),
    /// Never completes; for cancellation and deadline tests.
    Hang,
}

type Handler = Box<dyn Fn(&HttpRequest) -> StubReply + Send + Sync>;

pub(crate) struct StubTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> StubReply + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError> {
        let reply = (self.handler)(&request);
        self.requests.lock().push(request);

        match reply {
            StubReply::Respond(response) => Ok(response),
            StubReply::Fail(err) => Err(err),
            StubReply::Hang => std::future::pending().await,
        }
    }
}

pub(crate) fn ok(body: &str) -> StubReply {
    StubReply::Respond(HttpResponse::new(200, body))
}

pub(crate) fn exchange_error(status: u16, code: i64, msg: &str) -> StubReply {
    StubReply::Respond(HttpResponse::new(
        status,
        format!(r#"{{"code":{},"msg":"{}"}}"#, code, msg),
    ))
}

pub(crate) fn not_found() -> StubReply {
    StubReply::Respond(HttpResponse::new(404, ""))
}

pub(crate) fn test_credentials() -> ApiCredentials {
    ApiCredentials::new("test-api-key".into(), "test-secret".into())
}

/// Client with credentials and near-zero, jitter-free backoff.
pub(crate) fn test_client(transport: Arc<StubTransport>) -> BinanceRestClient {
    let config = ClientConfig {
        retry: RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: 0.0,
        },
        ..ClientConfig::default()
    }
    .with_credentials(test_credentials());

    BinanceRestClient::with_transport(config, transport)
}

/// Same as [`test_client`] but without credentials.
pub(crate) fn public_client(transport: Arc<StubTransport>) -> BinanceRestClient {
    let mut config = ClientConfig::default();
    config.retry.base_delay = Duration::from_millis(1);
    config.retry.jitter = 0.0;
    BinanceRestClient::with_transport(config, transport)
}
