//! Static table of every endpoint the client may call.
//!
//! The table is the only way to reach the exchange: an operation that is not
//! listed here cannot be issued. It holds read endpoints only.

use crate::error::ApiError;
use crate::limiter::RateBucket;
use crate::params::Params;
use common::ApiHost;
use rest_client::HttpMethod;

/// Declared request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> ParamSpec {
    ParamSpec { name, required: true }
}

const fn optional(name: &'static str) -> ParamSpec {
    ParamSpec { name, required: false }
}

/// One logical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: HttpMethod,
    pub host: ApiHost,
    pub path: &'static str,
    pub signed: bool,
    /// Weight when scoped by `scope_param`, or the only weight.
    pub weight: u32,
    /// Heavier weight charged when `scope_param` is omitted.
    pub unscoped_weight: Option<u32>,
    pub scope_param: Option<&'static str>,
    pub bucket: RateBucket,
    pub params: &'static [ParamSpec],
}

impl EndpointSpec {
    /// Weight charged for a call with these parameters.
    pub fn effective_weight(&self, params: &Params) -> u32 {
        match (self.scope_param, self.unscoped_weight) {
            (Some(scope), Some(unscoped)) if !params.contains(scope) => unscoped,
            _ => self.weight,
        }
    }

    /// Check `params` against the declared schema.
    ///
    /// # Errors
    /// `ValidationError` naming the first unknown or missing parameter.
    pub fn validate(&self, params: &Params) -> Result<(), ApiError> {
        if let Some(unknown) = params
            .names()
            .find(|name| !self.params.iter().any(|spec| spec.name == *name))
        {
            return Err(ApiError::validation(
                format!("unknown parameter '{}' for {}", unknown, self.name),
                Some(unknown),
            ));
        }

        if let Some(missing) = self
            .params
            .iter()
            .find(|spec| spec.required && !params.contains(spec.name))
        {
            return Err(ApiError::validation(
                format!("missing required parameter '{}' for {}", missing.name, self.name),
                Some(missing.name),
            ));
        }

        Ok(())
    }
}

const fn endpoint(
    name: &'static str,
    method: HttpMethod,
    host: ApiHost,
    path: &'static str,
    signed: bool,
    weight: u32,
    bucket: RateBucket,
    params: &'static [ParamSpec],
) -> EndpointSpec {
    EndpointSpec {
        name,
        method,
        host,
        path,
        signed,
        weight,
        unscoped_weight: None,
        scope_param: None,
        bucket,
        params,
    }
}

const fn scoped(mut spec: EndpointSpec, scope_param: &'static str, unscoped_weight: u32) -> EndpointSpec {
    spec.scope_param = Some(scope_param);
    spec.unscoped_weight = Some(unscoped_weight);
    spec
}

use HttpMethod::{Get, Post};
use RateBucket::{FuturesGeneral, SapiIp, SpotGeneral, Web};

static ENDPOINTS: &[EndpointSpec] = &[
    endpoint("server_time", Get, ApiHost::Spot, "/api/v3/time", false, 1, SpotGeneral, &[]),
    endpoint("futures_server_time", Get, ApiHost::Futures, "/fapi/v1/time", false, 1, FuturesGeneral, &[]),
    scoped(
        endpoint("ticker_price", Get, ApiHost::Spot, "/api/v3/ticker/price", false, 2, SpotGeneral, &[optional("symbol")]),
        "symbol",
        4,
    ),
    endpoint("ticker_24hr", Get, ApiHost::Spot, "/api/v3/ticker/24hr", false, 2, SpotGeneral, &[required("symbol")]),
    endpoint("spot_account", Get, ApiHost::Spot, "/api/v3/account", true, 20, SpotGeneral, &[optional("omitZeroBalances")]),
    scoped(
        endpoint("spot_open_orders", Get, ApiHost::Spot, "/api/v3/openOrders", true, 6, SpotGeneral, &[optional("symbol")]),
        "symbol",
        80,
    ),
    endpoint(
        "spot_trade_history",
        Get,
        ApiHost::Spot,
        "/api/v3/myTrades",
        true,
        20,
        SpotGeneral,
        &[required("symbol"), optional("startTime"), optional("endTime"), optional("fromId"), optional("limit")],
    ),
    endpoint("margin_account", Get, ApiHost::Spot, "/sapi/v1/margin/account", true, 10, SapiIp, &[]),
    endpoint(
        "isolated_margin_account",
        Get,
        ApiHost::Spot,
        "/sapi/v1/margin/isolated/account",
        true,
        10,
        SapiIp,
        &[optional("symbols")],
    ),
    // POST on the exchange side, but it only reads
    endpoint(
        "funding_wallet",
        Post,
        ApiHost::Spot,
        "/sapi/v1/asset/get-funding-asset",
        true,
        1,
        SapiIp,
        &[optional("asset"), optional("needBtcValuation")],
    ),
    endpoint(
        "deposit_address",
        Get,
        ApiHost::Spot,
        "/sapi/v1/capital/deposit/address",
        true,
        10,
        SapiIp,
        &[required("coin"), optional("network")],
    ),
    endpoint(
        "deposit_history",
        Get,
        ApiHost::Spot,
        "/sapi/v1/capital/deposit/hisrec",
        true,
        1,
        SapiIp,
        &[optional("coin"), optional("status"), optional("startTime"), optional("endTime"), optional("offset"), optional("limit")],
    ),
    endpoint(
        "withdraw_history",
        Get,
        ApiHost::Spot,
        "/sapi/v1/capital/withdraw/history",
        true,
        18,
        SapiIp,
        &[optional("coin"), optional("status"), optional("startTime"), optional("endTime"), optional("offset"), optional("limit")],
    ),
    endpoint("futures_account", Get, ApiHost::Futures, "/fapi/v2/account", true, 5, FuturesGeneral, &[]),
    scoped(
        endpoint("futures_open_orders", Get, ApiHost::Futures, "/fapi/v1/openOrders", true, 1, FuturesGeneral, &[optional("symbol")]),
        "symbol",
        40,
    ),
    endpoint(
        "futures_income_history",
        Get,
        ApiHost::Futures,
        "/fapi/v1/income",
        true,
        30,
        FuturesGeneral,
        &[optional("symbol"), optional("incomeType"), optional("startTime"), optional("endTime"), optional("limit")],
    ),
    endpoint(
        "announcements",
        Get,
        ApiHost::Web,
        "/bapi/composite/v1/public/market/notice/get",
        false,
        1,
        Web,
        &[optional("page"), optional("rows")],
    ),
];

/// Resolve an operation by name.
///
/// # Errors
/// `ConfigError` for names not in the catalog.
pub fn lookup(name: &str) -> Result<&'static EndpointSpec, ApiError> {
    ENDPOINTS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ApiError::config(format!("unknown operation '{}'", name)))
}

/// All catalog entries.
pub fn endpoints() -> &'static [EndpointSpec] {
    ENDPOINTS
}
