//! Binance REST API client.

use crate::catalog::{self, EndpointSpec};
use crate::clock::{server_time_from_date_header, ClockGuard};
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{classify_response, ApiError, ErrorKind};
use crate::limiter::RateLimiter;
use crate::params::{normalize_symbol, IncomeQuery, Params, TransferQuery};
use crate::responses::{
    AccountTrade, Announcement, AnnouncementsResponse, DepositAddress, DepositRecord,
    FundingAsset, FuturesAccount, FuturesOpenOrder, IncomeRecord, IsolatedMarginAccount,
    MarginAccount, OpenOrder, ServerTimeResponse, SpotAccount, Ticker24hr, TickerPrice,
    WithdrawRecord,
};
use auth::{canonical_query, ApiCredentials, RequestSigner};
use common::{ApiHost, BinanceEnvironment};
use metrics::{create_metrics, SharedMetrics};
use rest_client::{HttpRequest, HttpResponse, HttpTransport, RestClient};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Most trades returned by `myTrades` in one call.
const MAX_TRADE_LIMIT: u32 = 1000;

/// Most announcements the website returns per page.
const MAX_ANNOUNCEMENTS: u32 = 20;

/// Most symbols accepted by the isolated margin account endpoint.
const MAX_ISOLATED_SYMBOLS: usize = 5;

/// Drift a `Date` header can show without the clock being wrong.
const DATE_HEADER_PRECISION_MS: i64 = 1_000;

/// Per-call progress of the timestamp-rejection recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResyncState {
    Normal,
    ResyncPending,
    Retried,
}

/// Read-only Binance REST client.
///
/// Every request goes through the endpoint catalog, the rate limiter and,
/// for private endpoints, the signer with the clock guard's offset. Failures
/// are classified into [`ApiError`] and retried according to [`RetryConfig`].
///
/// The client is `Send + Sync`; share it behind an `Arc`.
pub struct BinanceRestClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Option<ApiCredentials>,
    environment: BinanceEnvironment,
    recv_window_ms: u64,
    retry: RetryConfig,
    clock: Arc<ClockGuard>,
    limiter: Arc<RateLimiter>,
    metrics: SharedMetrics,
}

impl BinanceRestClient {
    /// Create a client backed by `reqwest`.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = RestClient::new(config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            credentials: config.credentials,
            environment: config.environment,
            recv_window_ms: config.recv_window_ms,
            retry: config.retry,
            clock: Arc::new(ClockGuard::new()),
            limiter: Arc::new(RateLimiter::new(config.rate_limits)),
            metrics: create_metrics(),
        }
    }

    pub fn environment(&self) -> BinanceEnvironment {
        self.environment
    }

    /// True if private (signed) endpoints can be called.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn clock(&self) -> &Arc<ClockGuard> {
        &self.clock
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    // ========================================================================
    // Time Synchronization
    // ========================================================================

    /// Synchronize the clock guard with Binance server time.
    ///
    /// Should be called on startup; returns the new offset in milliseconds.
    pub async fn sync_time(&self) -> Result<i64, ApiError> {
        self.sync_time_from(ApiHost::Spot).await
    }

    /// Refresh the clock offset every `interval` until the client is dropped.
    ///
    /// A tick is skipped when something else resynced the clock within the
    /// last `interval`.
    pub fn spawn_time_sync(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let client = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(strong) = client.upgrade() else {
                    break;
                };
                if !strong.clock.needs_resync(interval) {
                    tracing::debug!("Clock recently synchronized, skipping periodic sync");
                    continue;
                }
                if let Err(e) = strong.sync_time().await {
                    tracing::warn!(error = %e, "Periodic time sync failed");
                }
            }
        })
    }

    /// Fetch server time once from the given host. Not retried.
    async fn sync_time_from(&self, host: ApiHost) -> Result<i64, ApiError> {
        let name = match host {
            ApiHost::Futures => "futures_server_time",
            ApiHost::Spot | ApiHost::Web => "server_time",
        };
        let spec = catalog::lookup(name)?;

        let (response, rtt) = self.dispatch(spec, &Params::new()).await?;

        if let Some(err) = classify_response(&response) {
            return Err(err);
        }
        let time: ServerTimeResponse = decode(spec, &response.body)?;

        let offset = self.clock.resync_with_rtt(time.server_time, rtt);
        self.metrics.inc_clock_resyncs();

        tracing::info!(
            server_time = time.server_time,
            offset_ms = offset,
            rtt_ms = rtt.as_millis() as u64,
            "Time synchronized with Binance server"
        );

        Ok(offset)
    }

    /// Re-estimate the offset after a `-1021` rejection.
    ///
    /// Prefers the rejection's own `Date` header, which costs no extra request.
    async fn resync_after_rejection(
        &self,
        host: ApiHost,
        rejection: &HttpResponse,
    ) -> Result<i64, ApiError> {
        if let Some(server_time) = rejection
            .header("date")
            .and_then(server_time_from_date_header)
        {
            let offset = self.clock.resync(server_time);
            self.metrics.inc_clock_resyncs();
            tracing::info!(
                offset_ms = offset,
                source = "date_header",
                "Clock resynchronized after timestamp rejection"
            );
            return Ok(offset);
        }

        self.sync_time_from(host).await
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Call any catalog operation and decode its body.
    ///
    /// # Errors
    /// `ConfigError` for unknown operations, `ValidationError` for parameters
    /// outside the operation's schema, otherwise whatever the exchange returned
    /// after retries.
    pub async fn call<T: DeserializeOwned>(&self, name: &str, params: Params) -> Result<T, ApiError> {
        let spec = catalog::lookup(name)?;
        spec.validate(&params)?;

        let response = self.execute(spec, &params).await?;
        decode(spec, &response.body)
    }

    /// Run one logical call through the retry policy.
    async fn execute(&self, spec: &EndpointSpec, params: &Params) -> Result<HttpResponse, ApiError> {
        let mut transient = self.retry.backoff();
        let mut throttled = self.retry.backoff();
        let mut resync = ResyncState::Normal;

        loop {
            let error = match self.dispatch(spec, params).await {
                Ok((response, _)) => match classify_response(&response) {
                    None => {
                        self.metrics.inc_requests_succeeded();
                        return Ok(response);
                    }
                    Some(error) if error.is_timestamp() && resync == ResyncState::Normal => {
                        resync = ResyncState::ResyncPending;
                        tracing::warn!(
                            operation = spec.name,
                            offset_ms = self.clock.current_offset(),
                            state = ?resync,
                            "Timestamp rejected, resynchronizing clock"
                        );

                        if let Err(sync_error) = self.resync_after_rejection(spec.host, &response).await {
                            tracing::warn!(error = %sync_error, "Clock resync failed");
                            self.metrics.inc_requests_failed();
                            return Err(error);
                        }

                        resync = ResyncState::Retried;
                        self.metrics.inc_retries();
                        continue;
                    }
                    Some(error) => error,
                },
                Err(error) => error,
            };

            let backoff = match error.kind {
                ErrorKind::Network | ErrorKind::Server if error.retriable => Some(&mut transient),
                ErrorKind::RateLimit if error.retriable => Some(&mut throttled),
                _ => None,
            };

            match backoff {
                Some(backoff) if backoff.attempt() + 1 < self.retry.max_attempts => {
                    let delay = backoff.next_delay_at_least(error.retry_after);
                    tracing::warn!(
                        operation = spec.name,
                        error = %error,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    self.metrics.inc_retries();
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    tracing::debug!(
                        operation = spec.name,
                        error = %error,
                        timestamp_retried = resync == ResyncState::Retried,
                        "Request failed"
                    );
                    self.metrics.inc_requests_failed();
                    return Err(error);
                }
            }
        }
    }

    /// Admit, sign and send exactly one HTTP request.
    ///
    /// Only transport failures are errors here; the response is not classified.
    /// The returned duration covers the network exchange alone, never the
    /// time spent waiting for rate budget.
    async fn dispatch(
        &self,
        spec: &EndpointSpec,
        params: &Params,
    ) -> Result<(HttpResponse, Duration), ApiError> {
        if spec.signed && self.credentials.is_none() {
            return Err(ApiError::config(format!(
                "{} requires API credentials (set BINANCE_API_KEY and BINANCE_API_SECRET)",
                spec.name
            )));
        }

        let waited = self
            .limiter
            .admit(spec.bucket, spec.effective_weight(params))
            .await?;
        if !waited.is_zero() {
            self.metrics.inc_limiter_waits();
        }

        // Signed after admission so the timestamp is fresh
        let request = self.build_request(spec, params)?;

        tracing::debug!(
            operation = spec.name,
            method = %spec.method,
            path = spec.path,
            signed = spec.signed,
            "Dispatching request"
        );
        self.metrics.inc_requests_sent();

        let sent_at = Instant::now();
        let response = self.transport.send(request).await?;
        let round_trip = sent_at.elapsed();

        if response.is_success() {
            self.observe_date_header(&response);
        }

        if let Some(used) = spec
            .bucket
            .used_weight_header()
            .and_then(|name| response.header(name))
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            self.limiter.observe_used_weight(spec.bucket, used);
        }

        Ok((response, round_trip))
    }

    /// Resync from a successful response's `Date` header when the local
    /// estimate has drifted beyond the header's one-second precision.
    fn observe_date_header(&self, response: &HttpResponse) {
        let Some(server_time) = response.header("date").and_then(server_time_from_date_header) else {
            return;
        };

        let drift = server_time - self.clock.timestamp_ms();
        if drift.abs() <= DATE_HEADER_PRECISION_MS {
            return;
        }

        let offset = self.clock.resync(server_time);
        self.metrics.inc_clock_resyncs();
        tracing::info!(
            drift_ms = drift,
            offset_ms = offset,
            source = "date_header",
            "Clock drift detected, resynchronized"
        );
    }

    fn build_request(&self, spec: &EndpointSpec, params: &Params) -> Result<HttpRequest, ApiError> {
        let base_url = self.environment.base_url(spec.host);
        let pairs = params.as_pairs();

        if !spec.signed {
            let query = canonical_query(&pairs);
            return Ok(HttpRequest::new(spec.method, base_url, spec.path, Some(query)));
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ApiError::config(format!("{} requires API credentials", spec.name)))?;

        let signer = RequestSigner::new(credentials);
        let query = signer.sign_params(&pairs, self.clock.timestamp_ms(), Some(self.recv_window_ms));

        Ok(HttpRequest::new(spec.method, base_url, spec.path, Some(query))
            .with_header("X-MBX-APIKEY", credentials.api_key()))
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Current server time in milliseconds.
    pub async fn server_time(&self) -> Result<i64, ApiError> {
        let response: ServerTimeResponse = self.call("server_time", Params::new()).await?;
        Ok(response.server_time)
    }

    /// Latest price for one symbol.
    ///
    /// GET /api/v3/ticker/price
    pub async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ApiError> {
        let params = Params::new().with("symbol", require_symbol(symbol, "symbol")?);
        self.call("ticker_price", params).await
    }

    /// Latest prices for every symbol.
    pub async fn all_ticker_prices(&self) -> Result<Vec<TickerPrice>, ApiError> {
        self.call("ticker_price", Params::new()).await
    }

    /// Rolling 24h statistics for one symbol.
    pub async fn ticker_24hr(&self, symbol: &str) -> Result<Ticker24hr, ApiError> {
        let params = Params::new().with("symbol", require_symbol(symbol, "symbol")?);
        self.call("ticker_24hr", params).await
    }

    /// Latest Binance announcements.
    ///
    /// `count` is capped at 20 and `page` starts at 1.
    pub async fn announcements(&self, count: u32, page: u32) -> Result<Vec<Announcement>, ApiError> {
        let params = Params::new()
            .with("page", page.max(1))
            .with("rows", count.clamp(1, MAX_ANNOUNCEMENTS));

        let response: AnnouncementsResponse = self.call("announcements", params).await?;
        if !response.is_success() {
            return Err(ApiError::server(format!(
                "announcements returned code {}: {}",
                response.code,
                response.message.as_deref().unwrap_or("unknown error")
            )));
        }
        Ok(response.data)
    }

    // ========================================================================
    // Spot and Margin
    // ========================================================================

    /// GET /api/v3/account
    ///
    /// Zero balances are omitted by the exchange.
    pub async fn spot_account(&self) -> Result<SpotAccount, ApiError> {
        let params = Params::new().with("omitZeroBalances", "true");
        self.call("spot_account", params).await
    }

    /// Open spot orders, for one symbol or all of them.
    pub async fn spot_open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>, ApiError> {
        let params = Params::new().with_opt("symbol", optional_symbol(symbol));
        self.call("spot_open_orders", params).await
    }

    /// Most recent fills for a symbol; `limit` is capped at 1000.
    pub async fn spot_trade_history(&self, symbol: &str, limit: u32) -> Result<Vec<AccountTrade>, ApiError> {
        let params = Params::new()
            .with("symbol", require_symbol(symbol, "symbol")?)
            .with("limit", limit.clamp(1, MAX_TRADE_LIMIT));
        self.call("spot_trade_history", params).await
    }

    /// GET /sapi/v1/margin/account
    pub async fn margin_account(&self) -> Result<MarginAccount, ApiError> {
        self.call("margin_account", Params::new()).await
    }

    /// Isolated margin pairs; all of them when `symbols` is empty (at most 5 otherwise).
    pub async fn isolated_margin_account(&self, symbols: &[&str]) -> Result<IsolatedMarginAccount, ApiError> {
        if symbols.len() > MAX_ISOLATED_SYMBOLS {
            return Err(ApiError::validation(
                format!("at most {} symbols can be queried at once", MAX_ISOLATED_SYMBOLS),
                Some("symbols"),
            ));
        }

        let joined = symbols
            .iter()
            .map(|s| normalize_symbol(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let params = Params::new().with_opt("symbols", (!joined.is_empty()).then_some(joined));
        self.call("isolated_margin_account", params).await
    }

    // ========================================================================
    // Wallet
    // ========================================================================

    /// Funding wallet balances, optionally for one asset.
    pub async fn funding_wallet(&self, asset: Option<&str>) -> Result<Vec<FundingAsset>, ApiError> {
        let params = Params::new().with_opt("asset", optional_symbol(asset));
        self.call("funding_wallet", params).await
    }

    pub async fn deposit_address(&self, coin: &str, network: Option<&str>) -> Result<DepositAddress, ApiError> {
        let params = Params::new()
            .with("coin", require_symbol(coin, "coin")?)
            .with_opt("network", optional_symbol(network));
        self.call("deposit_address", params).await
    }

    pub async fn deposit_history(&self, query: &TransferQuery) -> Result<Vec<DepositRecord>, ApiError> {
        self.call("deposit_history", query.to_params()).await
    }

    pub async fn withdraw_history(&self, query: &TransferQuery) -> Result<Vec<WithdrawRecord>, ApiError> {
        self.call("withdraw_history", query.to_params()).await
    }

    // ========================================================================
    // USDT-margined Futures
    // ========================================================================

    /// GET /fapi/v2/account
    pub async fn futures_account(&self) -> Result<FuturesAccount, ApiError> {
        self.call("futures_account", Params::new()).await
    }

    pub async fn futures_open_orders(&self, symbol: Option<&str>) -> Result<Vec<FuturesOpenOrder>, ApiError> {
        let params = Params::new().with_opt("symbol", optional_symbol(symbol));
        self.call("futures_open_orders", params).await
    }

    pub async fn futures_income_history(&self, query: &IncomeQuery) -> Result<Vec<IncomeRecord>, ApiError> {
        self.call("futures_income_history", query.to_params()).await
    }
}

impl std::fmt::Debug for BinanceRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceRestClient")
            .field("environment", &self.environment)
            .field("api_key", &self.credentials.as_ref().map(ApiCredentials::api_key))
            .field("recv_window_ms", &self.recv_window_ms)
            .field("time_offset_ms", &self.clock.current_offset())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(spec: &EndpointSpec, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::decode(format!("{}: unexpected response body: {}", spec.name, e)))
}

fn require_symbol(value: &str, field: &str) -> Result<String, ApiError> {
    let symbol = normalize_symbol(value);
    if symbol.is_empty() {
        return Err(ApiError::validation(format!("{} must not be empty", field), Some(field)));
    }
    Ok(symbol)
}

fn optional_symbol(value: Option<&str>) -> Option<String> {
    value.map(normalize_symbol).filter(|s| !s.is_empty())
}
