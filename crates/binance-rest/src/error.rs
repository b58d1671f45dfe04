//! Error taxonomy for the Binance REST core.
//!
//! Every failure reaching a caller is an [`ApiError`] tagged with an
//! [`ErrorKind`]. Raw HTTP responses are mapped by [`classify_response`], which
//! looks at the exchange's `{"code": .., "msg": ..}` envelope first and falls
//! back to the HTTP status.

use auth::CredentialError;
use rest_client::{HttpResponse, RestError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stable error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Catalog or credential misuse. Never retried.
    Config,
    /// Bad key, bad signature or missing permission. Never retried.
    Auth,
    /// Malformed parameters. Never retried.
    Validation,
    /// Request timestamp outside the receive window; triggers one resync + retry.
    Timestamp,
    /// Request weight or request count exceeded.
    RateLimit,
    /// Timeout or connection failure before a response arrived.
    Network,
    /// Exchange-side failure (5xx or internal error codes).
    Server,
    /// A successful response whose body could not be decoded.
    Decode,
    /// The caller's overall deadline elapsed.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "ConfigError",
            Self::Auth => "AuthError",
            Self::Validation => "ValidationError",
            Self::Timestamp => "TimestampError",
            Self::RateLimit => "RateLimitError",
            Self::Network => "NetworkError",
            Self::Server => "ServerError",
            Self::Decode => "DecodeError",
            Self::Timeout => "TimeoutError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure. Immutable once constructed.
#[derive(Debug, Clone, Error)]
#[error("{kind}{code}: {message}{hint}", code = code_suffix(.exchange_code), hint = hint_for(.kind))]
pub struct ApiError {
    pub kind: ErrorKind,
    /// Exchange error code from the response envelope, if any.
    pub exchange_code: Option<i64>,
    pub message: String,
    pub retriable: bool,
    /// Offending parameter for validation errors, when the exchange names it.
    pub field: Option<String>,
    /// Server-provided wait hint (`Retry-After`).
    pub retry_after: Option<Duration>,
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

fn hint_for(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Auth => " (check the API key, its permissions and IP whitelist)",
        _ => "",
    }
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>, retriable: bool) -> Self {
        Self {
            kind,
            exchange_code: None,
            message: message.into(),
            retriable,
            field: None,
            retry_after: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message, false)
    }

    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        let mut err = Self::new(ErrorKind::Validation, message, false);
        err.field = field.map(str::to_string);
        err
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message, true)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message, false)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    pub fn is_timestamp(&self) -> bool {
        self.kind == ErrorKind::Timestamp
    }
}

impl From<RestError> for ApiError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::RequestBuild(message) => Self::config(message),
            other => {
                let retriable = other.is_retryable();
                Self::new(ErrorKind::Network, other.to_string(), retriable)
            }
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        Self::config(err.to_string())
    }
}

/// Longest body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 256;

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    code: i64,
    msg: String,
}

/// Classify a raw response. Returns `None` when it is a success.
///
/// Some `/sapi` endpoints answer HTTP 200 with an error envelope, so a
/// negative `code` is treated as an error regardless of status.
pub fn classify_response(response: &HttpResponse) -> Option<ApiError> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(&response.body).ok();
    let retry_after = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let mut error = match envelope {
        Some(env) if env.code < 0 => classify_code(response.status, env.code, env.msg),
        _ if response.is_success() => return None,
        _ => classify_status(response.status, &response.body),
    };

    if error.kind == ErrorKind::RateLimit {
        error.retry_after = retry_after;
    }
    Some(error)
}

/// Map an exchange error code to a category.
fn classify_code(status: u16, code: i64, message: String) -> ApiError {
    let (kind, retriable) = match code {
        -1021 => (ErrorKind::Timestamp, true),
        -1002 | -1022 | -2008 | -2014 | -2015 => (ErrorKind::Auth, false),
        // 418 means the IP is already banned; waiting a few seconds won't help
        -1003 | -1015 => (ErrorKind::RateLimit, status != 418),
        -1000 | -1001 | -1006 | -1007 | -1008 => (ErrorKind::Server, true),
        -1199..=-1100 => (ErrorKind::Validation, false),
        _ => {
            let by_status = classify_status(status, &message);
            (by_status.kind, by_status.retriable)
        }
    };

    let field = if kind == ErrorKind::Validation {
        quoted_parameter(&message)
    } else {
        None
    };

    ApiError {
        kind,
        exchange_code: Some(code),
        message,
        retriable,
        field,
        retry_after: None,
    }
}

/// Map an HTTP status without a usable envelope.
fn classify_status(status: u16, body: &str) -> ApiError {
    let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
    let message = if excerpt.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, excerpt)
    };

    match status {
        429 => ApiError::new(ErrorKind::RateLimit, message, true),
        418 => ApiError::new(ErrorKind::RateLimit, message, false),
        401 | 403 => ApiError::new(ErrorKind::Auth, message, false),
        500..=599 => ApiError::new(ErrorKind::Server, message, true),
        400..=499 => ApiError::new(ErrorKind::Validation, message, false),
        _ => ApiError::new(ErrorKind::Server, message, false),
    }
}

/// Extract `name` from messages like `Mandatory parameter 'name' was not sent`.
fn quoted_parameter(message: &str) -> Option<String> {
    let start = message.find('\'')? + 1;
    let len = message[start..].find('\'')?;
    let name = &message[start..start + len];
    (!name.is_empty()).then(|| name.to_string())
}
