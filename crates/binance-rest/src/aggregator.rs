//! Concurrent portfolio snapshot across account types.

use crate::client::BinanceRestClient;
use crate::error::ApiError;
use crate::normalize::{apply_usd_prices, AccountResponse};
use futures_util::future::join_all;
use model::{AccountType, FetchStatus, PortfolioSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Default overall deadline for one snapshot.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Which account types to fetch, and how.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    pub account_types: BTreeSet<AccountType>,
    pub deadline: Duration,
    /// Price balances in USD with one extra public ticker call.
    pub value_in_usd: bool,
}

impl Default for AggregateRequest {
    fn default() -> Self {
        Self {
            account_types: AccountType::ALL.into_iter().collect(),
            deadline: DEFAULT_DEADLINE,
            value_in_usd: false,
        }
    }
}

impl AggregateRequest {
    pub fn only(account_types: impl IntoIterator<Item = AccountType>) -> Self {
        Self {
            account_types: account_types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_usd_valuation(mut self) -> Self {
        self.value_in_usd = true;
        self
    }
}

/// Fans account calls out concurrently and merges them into one snapshot.
///
/// A failing account type is reported in the snapshot's statuses and never
/// fails the whole snapshot. Only the overall deadline does.
pub struct AccountAggregator<'a> {
    client: &'a BinanceRestClient,
}

impl<'a> AccountAggregator<'a> {
    pub fn new(client: &'a BinanceRestClient) -> Self {
        Self { client }
    }

    /// Build a snapshot of the requested account types.
    ///
    /// # Errors
    /// `ValidationError` if no account type was requested, `TimeoutError` if
    /// the deadline elapsed. No partial snapshot is returned.
    pub async fn snapshot(&self, request: AggregateRequest) -> Result<PortfolioSnapshot, ApiError> {
        if request.account_types.is_empty() {
            return Err(ApiError::validation(
                "at least one account type must be requested",
                Some("account_types"),
            ));
        }

        match tokio::time::timeout(request.deadline, self.collect(&request)).await {
            Ok(snapshot) => Ok(snapshot),
            Err(_) => {
                tracing::warn!(
                    deadline_ms = request.deadline.as_millis() as u64,
                    "Portfolio snapshot deadline exceeded"
                );
                Err(ApiError::timeout(format!(
                    "portfolio snapshot did not complete within {:?}",
                    request.deadline
                )))
            }
        }
    }

    async fn collect(&self, request: &AggregateRequest) -> PortfolioSnapshot {
        // BTreeSet iteration is already in snapshot order
        let fetches = join_all(
            request
                .account_types
                .iter()
                .map(|&account_type| async move { (account_type, self.fetch(account_type).await) }),
        );

        let (results, tickers) = if request.value_in_usd {
            let (results, tickers) = tokio::join!(fetches, self.client.all_ticker_prices());
            (results, Some(tickers))
        } else {
            (fetches.await, None)
        };

        let mut balances = Vec::new();
        let mut statuses = BTreeMap::new();

        for (account_type, result) in results {
            match result {
                Ok(response) => {
                    balances.extend(response.into_balances().into_iter().filter(|b| !b.is_zero()));
                    statuses.insert(account_type, FetchStatus::Ok);
                }
                Err(e) => {
                    tracing::warn!(account_type = %account_type, error = %e, "Account fetch failed");
                    statuses.insert(
                        account_type,
                        FetchStatus::Failed {
                            kind: e.kind.as_str().to_string(),
                            reason: e.message,
                        },
                    );
                }
            }
        }

        match tickers {
            Some(Ok(tickers)) => apply_usd_prices(&mut balances, &tickers),
            Some(Err(e)) => tracing::warn!(error = %e, "USD pricing unavailable"),
            None => {}
        }

        tracing::info!(
            balances = balances.len(),
            failed = statuses.values().filter(|s| !s.is_ok()).count(),
            "Portfolio snapshot collected"
        );

        PortfolioSnapshot {
            balances,
            statuses,
            taken_at_ms: self.client.clock().timestamp_ms(),
        }
    }

    async fn fetch(&self, account_type: AccountType) -> Result<AccountResponse, ApiError> {
        let client = self.client;
        let response = match account_type {
            AccountType::Spot => AccountResponse::Spot(client.spot_account().await?),
            AccountType::CrossMargin => AccountResponse::CrossMargin(client.margin_account().await?),
            AccountType::IsolatedMargin => {
                AccountResponse::IsolatedMargin(client.isolated_margin_account(&[]).await?)
            }
            AccountType::Futures => AccountResponse::Futures(client.futures_account().await?),
            AccountType::Funding => AccountResponse::Funding(client.funding_wallet(None).await?),
        };
        Ok(response)
    }
}

impl BinanceRestClient {
    /// Shorthand for [`AccountAggregator::snapshot`].
    pub async fn portfolio_snapshot(&self, request: AggregateRequest) -> Result<PortfolioSnapshot, ApiError> {
        AccountAggregator::new(self).snapshot(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const SPOT: &str = r#"{"canTrade":true,"canWithdraw":true,"canDeposit":true,"balances":[
        {"asset":"BTC","free":"0.5","locked":"0"},
        {"asset":"ETH","free":"0","locked":"0"},
        {"asset":"BNB","free":"0.001","locked":"0"}]}"#;
    const MARGIN: &str = r#"{"marginLevel":"999","totalAssetOfBtc":"0","totalLiabilityOfBtc":"0","totalNetAssetOfBtc":"0","userAssets":[
        {"asset":"USDT","free":"25","locked":"0","borrowed":"0","interest":"0","netAsset":"25"}]}"#;
    const ISOLATED: &str = r#"{"assets":[{"symbol":"BTCUSDT","marginLevel":"999","liquidatePrice":"0",
        "baseAsset":{"asset":"BTC","free":"0","locked":"0","borrowed":"0","interest":"0","netAsset":"0"},
        "quoteAsset":{"asset":"USDT","free":"10","locked":"0","borrowed":"0","interest":"0","netAsset":"10"}}]}"#;
    const FUTURES: &str = r#"{"totalWalletBalance":"100","totalUnrealizedProfit":"0","totalMarginBalance":"100","availableBalance":"80","maxWithdrawAmount":"80",
        "assets":[{"asset":"USDT","walletBalance":"100","unrealizedProfit":"0","marginBalance":"100","availableBalance":"80","maxWithdrawAmount":"80"}]}"#;
    const FUNDING: &str = r#"[{"asset":"USDC","free":"5","locked":"0","freeze":"1","withdrawing":"0"}]"#;

    fn healthy(path: &str) -> StubReply {
        match path {
            "/api/v3/account" => ok(SPOT),
            "/sapi/v1/margin/account" => ok(MARGIN),
            "/sapi/v1/margin/isolated/account" => ok(ISOLATED),
            "/fapi/v2/account" => ok(FUTURES),
            "/sapi/v1/asset/get-funding-asset" => ok(FUNDING),
            "/api/v3/ticker/price" => ok(r#"[{"symbol":"BTCUSDT","price":"65000"},{"symbol":"BNBUSDT","price":"600"}]"#),
            _ => not_found(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_all_types_in_order() {
        let stub = StubTransport::new(|request| healthy(&request.path));
        let client = test_client(stub.clone());

        let snapshot = client.portfolio_snapshot(AggregateRequest::default()).await.unwrap();

        assert!(snapshot.is_complete());
        assert_eq!(snapshot.statuses.len(), 5);
        let order: Vec<AccountType> = snapshot.balances.iter().map(|b| b.account_type).collect();
        assert_eq!(
            order,
            vec![
                AccountType::Spot,
                AccountType::Spot,
                AccountType::CrossMargin,
                AccountType::IsolatedMargin,
                AccountType::Futures,
                AccountType::Funding,
            ]
        );
        assert_eq!(stub.request_count(), 5);
    }

    #[tokio::test]
    async fn test_zero_balances_filtered_small_kept() {
        let stub = StubTransport::new(|request| healthy(&request.path));
        let client = test_client(stub);

        let snapshot = client
            .portfolio_snapshot(AggregateRequest::only([AccountType::Spot, AccountType::IsolatedMargin]))
            .await
            .unwrap();

        let assets: Vec<&str> = snapshot.balances.iter().map(|b| b.asset.as_str()).collect();
        assert_eq!(assets, vec!["BTC", "BNB", "USDT"]);
        assert_eq!(snapshot.balances[1].free, dec!(0.001));
        assert_eq!(snapshot.balances[2].isolated_symbol.as_deref(), Some("BTCUSDT"));
    }

    #[tokio::test]
    async fn test_failed_type_does_not_fail_snapshot() {
        let stub = StubTransport::new(|request| match request.path.as_str() {
            "/fapi/v2/account" => exchange_error(401, -2015, "Invalid API-key, IP, or permissions for action."),
            path => healthy(path),
        });
        let client = test_client(stub);

        let snapshot = client.portfolio_snapshot(AggregateRequest::default()).await.unwrap();

        assert!(!snapshot.is_complete());
        assert_eq!(snapshot.failed_types(), vec![AccountType::Futures]);
        match &snapshot.statuses[&AccountType::Futures] {
            FetchStatus::Failed { kind, reason } => {
                assert_eq!(kind, "AuthError");
                assert!(reason.contains("Invalid API-key"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(snapshot.balances_for(AccountType::Futures).count(), 0);
        assert_eq!(snapshot.balances_for(AccountType::Spot).count(), 2);
        assert_eq!(snapshot.balances_for(AccountType::Funding).count(), 1);
    }

    #[tokio::test]
    async fn test_usd_valuation() {
        let stub = StubTransport::new(|request| healthy(&request.path));
        let client = test_client(stub.clone());

        let snapshot = client
            .portfolio_snapshot(AggregateRequest::only([AccountType::Spot, AccountType::Funding]).with_usd_valuation())
            .await
            .unwrap();

        assert_eq!(snapshot.balances[0].usd_value, Some(dec!(32500)));
        assert_eq!(snapshot.balances[1].usd_value, Some(dec!(0.6)));
        // Funding USDC: free 5 + freeze 1
        assert_eq!(snapshot.balances[2].usd_value, Some(dec!(6)));
        assert_eq!(snapshot.total_usd_value(), Some(dec!(32506.6)));
        assert_eq!(stub.requests_to("/api/v3/ticker/price").len(), 1);
    }

    #[tokio::test]
    async fn test_pricing_failure_leaves_values_unset() {
        let stub = StubTransport::new(|request| match request.path.as_str() {
            "/api/v3/ticker/price" => exchange_error(400, -1121, "Invalid symbol."),
            path => healthy(path),
        });
        let client = test_client(stub);

        let snapshot = client
            .portfolio_snapshot(AggregateRequest::only([AccountType::Spot]).with_usd_valuation())
            .await
            .unwrap();

        assert!(snapshot.is_complete());
        assert!(snapshot.balances.iter().all(|b| b.usd_value.is_none()));
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let stub = StubTransport::new(|request| healthy(&request.path));
        let client = test_client(stub.clone());

        let err = client.portfolio_snapshot(AggregateRequest::only(Vec::new())).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded_is_timeout() {
        let stub = StubTransport::new(|request| match request.path.as_str() {
            "/fapi/v2/account" => StubReply::Hang,
            path => healthy(path),
        });
        let client = test_client(stub);

        let err = client
            .portfolio_snapshot(AggregateRequest::default().with_deadline(Duration::from_secs(2)))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_snapshot_yields_nothing() {
        let stub = StubTransport::new(|_| StubReply::Hang);
        let client = Arc::new(test_client(stub.clone()));

        let task = {
            let client = client.clone();
            tokio::spawn(async move { client.portfolio_snapshot(AggregateRequest::default()).await })
        };

        while stub.request_count() < 5 {
            tokio::task::yield_now().await;
        }
        task.abort();

        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(client.metrics().requests_succeeded(), 0);
    }
}
