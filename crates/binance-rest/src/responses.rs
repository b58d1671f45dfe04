//! Binance API response types.
//!
//! Amounts arrive as JSON strings and are decoded straight into `Decimal`.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Response from GET /api/v3/time and GET /fapi/v1/time.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// Response from GET /api/v3/ticker/price.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

/// Response from GET /api/v3/ticker/24hr.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    pub price_change: Decimal,
    pub price_change_percent: Decimal,
    pub weighted_avg_price: Decimal,
    pub last_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: Decimal,
    pub quote_volume: Decimal,
    pub open_time: i64,
    pub close_time: i64,
    pub count: u64,
}

/// Response from GET /api/v3/account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotAccount {
    pub can_trade: bool,
    pub can_withdraw: bool,
    pub can_deposit: bool,
    #[serde(default)]
    pub update_time: i64,
    #[serde(default)]
    pub account_type: String,
    pub balances: Vec<SpotBalance>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// An open order from GET /api/v3/openOrders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub symbol: String,
    pub order_id: u64,
    pub client_order_id: String,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub status: String,
    pub time_in_force: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    pub time: i64,
    pub update_time: i64,
}

/// A fill from GET /api/v3/myTrades.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrade {
    pub symbol: String,
    pub id: u64,
    pub order_id: u64,
    pub price: Decimal,
    pub qty: Decimal,
    pub quote_qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
    pub time: i64,
    pub is_buyer: bool,
    pub is_maker: bool,
}

/// Response from GET /sapi/v1/margin/account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginAccount {
    #[serde(default)]
    pub borrow_enabled: bool,
    #[serde(default)]
    pub trade_enabled: bool,
    #[serde(default)]
    pub transfer_enabled: bool,
    pub margin_level: Decimal,
    pub total_asset_of_btc: Decimal,
    pub total_liability_of_btc: Decimal,
    pub total_net_asset_of_btc: Decimal,
    pub user_assets: Vec<MarginAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginAsset {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub borrowed: Decimal,
    pub interest: Decimal,
    pub net_asset: Decimal,
}

/// Response from GET /sapi/v1/margin/isolated/account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolatedMarginAccount {
    pub assets: Vec<IsolatedMarginPair>,
    #[serde(default)]
    pub total_net_asset_of_btc: Option<Decimal>,
}

/// One isolated pair with its base and quote legs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolatedMarginPair {
    pub symbol: String,
    pub base_asset: IsolatedAsset,
    pub quote_asset: IsolatedAsset,
    pub margin_level: Decimal,
    pub liquidate_price: Decimal,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolatedAsset {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub borrowed: Decimal,
    pub interest: Decimal,
    pub net_asset: Decimal,
}

/// An entry from POST /sapi/v1/asset/get-funding-asset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingAsset {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub freeze: Decimal,
    pub withdrawing: Decimal,
    #[serde(default)]
    pub btc_valuation: Option<Decimal>,
}

/// Response from GET /sapi/v1/capital/deposit/address.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositAddress {
    pub coin: String,
    pub address: String,
    /// Memo or tag; empty when the network needs none.
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub url: String,
}

/// An entry from GET /sapi/v1/capital/deposit/hisrec.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    #[serde(default)]
    pub id: String,
    pub amount: Decimal,
    pub coin: String,
    #[serde(default)]
    pub network: String,
    pub status: u8,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tx_id: String,
    pub insert_time: i64,
}

impl DepositRecord {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            0 => "pending",
            1 => "success",
            6 => "credited",
            7 => "wrong deposit",
            8 => "waiting user confirm",
            _ => "unknown",
        }
    }
}

/// An entry from GET /sapi/v1/capital/withdraw/history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRecord {
    pub id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_fee: Decimal,
    pub coin: String,
    pub status: u8,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tx_id: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub apply_time: String,
    #[serde(default)]
    pub network: String,
}

impl WithdrawRecord {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            0 => "email sent",
            1 => "cancelled",
            2 => "awaiting approval",
            3 => "rejected",
            4 => "processing",
            5 => "failure",
            6 => "completed",
            _ => "unknown",
        }
    }
}

/// Response from GET /fapi/v2/account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesAccount {
    pub total_wallet_balance: Decimal,
    pub total_unrealized_profit: Decimal,
    pub total_margin_balance: Decimal,
    pub available_balance: Decimal,
    pub max_withdraw_amount: Decimal,
    pub assets: Vec<FuturesAsset>,
    #[serde(default)]
    pub positions: Vec<FuturesPosition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesAsset {
    pub asset: String,
    pub wallet_balance: Decimal,
    pub unrealized_profit: Decimal,
    pub margin_balance: Decimal,
    pub available_balance: Decimal,
    pub max_withdraw_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesPosition {
    pub symbol: String,
    pub position_amt: Decimal,
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    pub unrealized_profit: Decimal,
    pub leverage: Decimal,
    #[serde(default)]
    pub position_side: String,
}

impl FuturesPosition {
    /// The account reports every symbol; only non-zero amounts are positions.
    pub fn is_open(&self) -> bool {
        !self.position_amt.is_zero()
    }
}

/// An open order from GET /fapi/v1/openOrders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesOpenOrder {
    pub symbol: String,
    pub order_id: u64,
    pub client_order_id: String,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub status: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default)]
    pub reduce_only: bool,
    pub time: i64,
    pub update_time: i64,
}

/// An entry from GET /fapi/v1/income.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    #[serde(default)]
    pub symbol: String,
    pub income_type: String,
    pub income: Decimal,
    pub asset: String,
    pub time: i64,
    #[serde(default)]
    pub info: String,
}

/// Sum income per `(income_type, asset)`, sorted by key.
pub fn income_totals(records: &[IncomeRecord]) -> Vec<(String, String, Decimal)> {
    let mut totals: std::collections::BTreeMap<(String, String), Decimal> = Default::default();
    for record in records {
        *totals
            .entry((record.income_type.clone(), record.asset.clone()))
            .or_default() += record.income;
    }
    totals
        .into_iter()
        .map(|((income_type, asset), total)| (income_type, asset, total))
        .collect()
}

/// Response from the website announcements endpoint.
///
/// Uses its own envelope: `code` is the string `"000000"` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementsResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<Announcement>,
}

impl AnnouncementsResponse {
    pub const SUCCESS_CODE: &'static str = "000000";

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS_CODE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Publication time in milliseconds.
    #[serde(default)]
    pub time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_server_time() {
        let json = r#"{"serverTime": 1499827319559}"#;
        let response: ServerTimeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.server_time, 1499827319559);
    }

    #[test]
    fn test_deserialize_ticker_list() {
        let json = r#"[{"symbol":"LTCBTC","price":"4.00000200"},{"symbol":"ETHBTC","price":"0.07946600"}]"#;
        let tickers: Vec<TickerPrice> = serde_json::from_str(json).unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[1].price, dec!(0.079466));
    }

    #[test]
    fn test_deserialize_spot_account() {
        let json = r#"{
            "makerCommission": 15,
            "canTrade": true,
            "canWithdraw": true,
            "canDeposit": true,
            "updateTime": 123456789,
            "accountType": "SPOT",
            "balances": [
                {"asset": "BTC", "free": "4723846.89208129", "locked": "0.00000000"},
                {"asset": "LTC", "free": "4763368.68006011", "locked": "0.00000000"}
            ],
            "permissions": ["SPOT"]
        }"#;
        let account: SpotAccount = serde_json::from_str(json).unwrap();
        assert!(account.can_trade);
        assert_eq!(account.balances.len(), 2);
        assert_eq!(account.balances[0].free, dec!(4723846.89208129));
    }

    #[test]
    fn test_deserialize_futures_account() {
        let json = r#"{
            "totalWalletBalance": "126.72469206",
            "totalUnrealizedProfit": "0.00000000",
            "totalMarginBalance": "126.72469206",
            "availableBalance": "126.72469206",
            "maxWithdrawAmount": "126.72469206",
            "assets": [{
                "asset": "USDT",
                "walletBalance": "23.72469206",
                "unrealizedProfit": "0.00000000",
                "marginBalance": "23.72469206",
                "maintMargin": "0.00000000",
                "availableBalance": "23.72469206",
                "maxWithdrawAmount": "23.72469206"
            }],
            "positions": [{
                "symbol": "BTCUSDT",
                "positionAmt": "0.000",
                "unrealizedProfit": "0.00000000",
                "leverage": "100",
                "entryPrice": "0.00000",
                "positionSide": "BOTH"
            }]
        }"#;
        let account: FuturesAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.assets[0].wallet_balance, dec!(23.72469206));
        assert!(!account.positions[0].is_open());
    }

    #[test]
    fn test_deserialize_funding_asset() {
        let json = r#"[{"asset":"USDT","free":"1","locked":"0","freeze":"0","withdrawing":"0","btcValuation":"0.00000091"}]"#;
        let assets: Vec<FundingAsset> = serde_json::from_str(json).unwrap();
        assert_eq!(assets[0].btc_valuation, Some(dec!(0.00000091)));
    }

    #[test]
    fn test_transfer_status_labels() {
        let json = r#"[{"id":"769800519366885376","amount":"0.001","coin":"BNB","network":"BNB","status":1,"address":"bnb136ns","txId":"98A3","insertTime":1661493146000}]"#;
        let deposits: Vec<DepositRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(deposits[0].status_label(), "success");

        let json = r#"[{"id":"b6ae22b3","amount":"8.91000000","transactionFee":"0.004","coin":"USDT","status":6,"address":"0x94df","txId":"0xb5ef","applyTime":"2019-10-12 11:12:02","network":"ETH"}]"#;
        let withdrawals: Vec<WithdrawRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(withdrawals[0].status_label(), "completed");
        assert_eq!(withdrawals[0].transaction_fee, dec!(0.004));
    }

    #[test]
    fn test_income_totals() {
        let json = r#"[
            {"symbol":"BTCUSDT","incomeType":"FUNDING_FEE","income":"-0.5","asset":"USDT","time":1,"info":"","tranId":1},
            {"symbol":"ETHUSDT","incomeType":"FUNDING_FEE","income":"0.2","asset":"USDT","time":2,"info":"","tranId":2},
            {"symbol":"BTCUSDT","incomeType":"REALIZED_PNL","income":"10","asset":"USDT","time":3,"info":"","tranId":3}
        ]"#;
        let records: Vec<IncomeRecord> = serde_json::from_str(json).unwrap();
        let totals = income_totals(&records);

        assert_eq!(
            totals,
            vec![
                ("FUNDING_FEE".to_string(), "USDT".to_string(), dec!(-0.3)),
                ("REALIZED_PNL".to_string(), "USDT".to_string(), dec!(10)),
            ]
        );
    }

    #[test]
    fn test_deserialize_announcements() {
        let json = r#"{"code":"000000","message":null,"data":[{"title":"Binance Will List X","url":"https://www.binance.com/en/support/announcement/x","time":1700000000000}]}"#;
        let response: AnnouncementsResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data[0].title, "Binance Will List X");
    }
}
