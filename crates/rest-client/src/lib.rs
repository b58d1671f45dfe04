//! HTTP transport for the Binance REST core.
//!
//! This crate provides:
//!
//! - [`HttpTransport`]: the seam the signing/retry layer talks to; one call,
//!   one HTTP exchange, no interpretation of the body
//! - [`RestClient`]: the `reqwest` implementation with a per-request timeout
//! - [`RestError`]: transport-level failures (timeouts, connection errors)
//!
//! Only `GET` and `POST` exist in [`HttpMethod`]; the core never issues
//! anything else.
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::{HttpMethod, HttpRequest, HttpTransport, RestClient};
//! use std::time::Duration;
//!
//! let client = RestClient::new(Duration::from_secs(10))?;
//! let request = HttpRequest::new(HttpMethod::Get, "https://api.binance.com", "/api/v3/time", None);
//! let response = client.send(request).await?;
//! assert_eq!(response.status, 200);
//! ```

mod client;
mod error;
mod transport;

pub use client::RestClient;
pub use error::RestError;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
