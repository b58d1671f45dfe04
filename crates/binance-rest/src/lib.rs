//! Read-only Binance REST client.
//!
//! This crate provides:
//!
//! - **Endpoint catalog**: a closed table of read endpoints; nothing else can be called
//! - **Request signing**: HMAC-SHA256 over the exact query string sent
//! - **Time synchronization**: clock offset tracking with resync on `-1021` rejections
//! - **Rate limiting**: per-bucket request weight budgets that delay instead of failing
//! - **Error handling**: one [`ApiError`] taxonomy with retry for transient failures
//! - **Portfolio aggregation**: concurrent balance snapshot across account types
//!
//! # Example
//!
//! ```rust,ignore
//! use binance_rest::{AggregateRequest, BinanceRestClient, ClientConfig};
//!
//! let client = BinanceRestClient::new(ClientConfig::from_env()?)?;
//! client.sync_time().await?;
//!
//! let btc = client.ticker_price("BTCUSDT").await?;
//! let snapshot = client.portfolio_snapshot(AggregateRequest::default()).await?;
//! println!("{}", snapshot);
//! ```

mod aggregator;
mod catalog;
mod client;
mod clock;
mod config;
mod error;
mod limiter;
mod normalize;
mod params;
mod responses;

#[cfg(test)]
mod test_support;

pub use aggregator::{AccountAggregator, AggregateRequest, DEFAULT_DEADLINE};
pub use catalog::{endpoints, lookup, EndpointSpec, ParamSpec};
pub use client::BinanceRestClient;
pub use clock::{local_now_ms, ClockGuard};
pub use config::{ClientConfig, RetryConfig, MAX_RECV_WINDOW_MS};
pub use error::{classify_response, ApiError, ErrorKind};
pub use limiter::{RateBucket, RateLimiter, RateLimits};
pub use normalize::{apply_usd_prices, is_usd_stablecoin, AccountResponse};
pub use params::{IncomeQuery, Params, TransferQuery};
pub use responses::{
    income_totals, AccountTrade, Announcement, AnnouncementsResponse, DepositAddress,
    DepositRecord, FundingAsset, FuturesAccount, FuturesAsset, FuturesOpenOrder,
    FuturesPosition, IncomeRecord, IsolatedAsset, IsolatedMarginAccount, IsolatedMarginPair,
    MarginAccount, MarginAsset, OpenOrder, ServerTimeResponse, SpotAccount, SpotBalance,
    Ticker24hr, TickerPrice, WithdrawRecord,
};
