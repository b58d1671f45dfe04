//! Client configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `BINANCE_API_KEY`, `BINANCE_API_SECRET` (or `BINANCE_SECRET_KEY`) | unset: public endpoints only |
//! | `BINANCE_ENVIRONMENT` | `production` |
//! | `BINANCE_RECV_WINDOW_MS` | 5000 |
//! | `BINANCE_REQUEST_TIMEOUT_MS` | 10000 |
//! | `BINANCE_MAX_ATTEMPTS` | 3 |
//! | `BINANCE_RETRY_BASE_MS` / `BINANCE_RETRY_MAX_MS` | 250 / 5000 |
//! | `BINANCE_SPOT_WEIGHT_LIMIT` / `BINANCE_SAPI_WEIGHT_LIMIT` / `BINANCE_FUTURES_WEIGHT_LIMIT` | 6000 / 12000 / 2400 |
//!
//! A `.env` file in the working directory is loaded first.

use crate::error::ApiError;
use crate::limiter::RateLimits;
use auth::ApiCredentials;
use common::{BinanceEnvironment, ExponentialBackoff};
use std::str::FromStr;
use std::time::Duration;

/// Binance rejects receive windows above one minute.
pub const MAX_RECV_WINDOW_MS: u64 = 60_000;

/// Retry budget and backoff shape.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries per failure category, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.base_delay, self.max_delay, self.jitter)
    }
}

/// Everything needed to build a [`BinanceRestClient`](crate::BinanceRestClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: BinanceEnvironment,
    /// `None` restricts the client to public endpoints.
    pub credentials: Option<ApiCredentials>,
    pub recv_window_ms: u64,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub rate_limits: RateLimits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: BinanceEnvironment::default(),
            credentials: None,
            recv_window_ms: 5_000,
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            rate_limits: RateLimits::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_environment(mut self, environment: BinanceEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// `ConfigError` if credentials are present but malformed.
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = match lookup("BINANCE_ENVIRONMENT") {
            Some(value) => value.parse::<BinanceEnvironment>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid BINANCE_ENVIRONMENT, using production");
                BinanceEnvironment::Production
            }),
            None => defaults.environment,
        };

        let credentials = ApiCredentials::from_lookup(&lookup)?;
        if credentials.is_none() {
            tracing::info!("No API credentials configured, private endpoints disabled");
        }

        let mut recv_window_ms =
            parse_or("BINANCE_RECV_WINDOW_MS", &lookup, defaults.recv_window_ms);
        if recv_window_ms == 0 || recv_window_ms > MAX_RECV_WINDOW_MS {
            tracing::warn!(
                recv_window_ms,
                "BINANCE_RECV_WINDOW_MS out of range, using default"
            );
            recv_window_ms = defaults.recv_window_ms;
        }

        let request_timeout = Duration::from_millis(parse_or(
            "BINANCE_REQUEST_TIMEOUT_MS",
            &lookup,
            defaults.request_timeout.as_millis() as u64,
        ));

        let retry = RetryConfig {
            max_attempts: parse_or("BINANCE_MAX_ATTEMPTS", &lookup, defaults.retry.max_attempts).max(1),
            base_delay: Duration::from_millis(parse_or(
                "BINANCE_RETRY_BASE_MS",
                &lookup,
                defaults.retry.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_or(
                "BINANCE_RETRY_MAX_MS",
                &lookup,
                defaults.retry.max_delay.as_millis() as u64,
            )),
            jitter: defaults.retry.jitter,
        };

        let rate_limits = RateLimits {
            spot_general: parse_or("BINANCE_SPOT_WEIGHT_LIMIT", &lookup, defaults.rate_limits.spot_general),
            sapi_ip: parse_or("BINANCE_SAPI_WEIGHT_LIMIT", &lookup, defaults.rate_limits.sapi_ip),
            futures_general: parse_or(
                "BINANCE_FUTURES_WEIGHT_LIMIT",
                &lookup,
                defaults.rate_limits.futures_general,
            ),
            ..defaults.rate_limits
        };

        Ok(Self {
            environment,
            credentials,
            recv_window_ms,
            request_timeout,
            retry,
            rate_limits,
        })
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
