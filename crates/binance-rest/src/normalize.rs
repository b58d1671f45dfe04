//! Per-account-type conversion into [`Balance`] records.
//!
//! Each account type reports balances in its own shape. The mapping to
//! `free`/`locked` is:
//!
//! - spot and cross margin: `free` / `locked` as reported
//! - isolated margin: both legs of every pair, tagged with the pair symbol
//! - futures: `free` is `maxWithdrawAmount` clamped to `[0, walletBalance]`,
//!   the rest of the wallet balance is `locked`
//! - funding: `locked + freeze + withdrawing` is `locked`

use crate::responses::{
    FundingAsset, FuturesAccount, FuturesAsset, IsolatedMarginAccount, MarginAccount, SpotAccount,
    TickerPrice,
};
use model::{AccountType, Balance};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Assets valued at one US dollar.
const USD_STABLECOINS: [&str; 7] = ["USDT", "USDC", "FDUSD", "BUSD", "TUSD", "USDP", "DAI"];

/// Quote asset used to price everything else.
const PRICING_QUOTE: &str = "USDT";

/// A raw account response, tagged by account type.
#[derive(Debug, Clone)]
pub enum AccountResponse {
    Spot(SpotAccount),
    CrossMargin(MarginAccount),
    IsolatedMargin(IsolatedMarginAccount),
    Futures(FuturesAccount),
    Funding(Vec<FundingAsset>),
}

impl AccountResponse {
    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Spot(_) => AccountType::Spot,
            Self::CrossMargin(_) => AccountType::CrossMargin,
            Self::IsolatedMargin(_) => AccountType::IsolatedMargin,
            Self::Futures(_) => AccountType::Futures,
            Self::Funding(_) => AccountType::Funding,
        }
    }

    /// Balances in the exchange's order, zero balances included.
    pub fn into_balances(self) -> Vec<Balance> {
        match self {
            Self::Spot(account) => account
                .balances
                .into_iter()
                .map(|b| Balance::new(AccountType::Spot, b.asset, b.free, b.locked))
                .collect(),
            Self::CrossMargin(account) => account
                .user_assets
                .into_iter()
                .map(|a| Balance::new(AccountType::CrossMargin, a.asset, a.free, a.locked))
                .collect(),
            Self::IsolatedMargin(account) => isolated_balances(account),
            Self::Futures(account) => account.assets.into_iter().map(futures_balance).collect(),
            Self::Funding(assets) => assets.into_iter().map(funding_balance).collect(),
        }
    }
}

fn isolated_balances(account: IsolatedMarginAccount) -> Vec<Balance> {
    account
        .assets
        .into_iter()
        .flat_map(|pair| {
            let symbol = pair.symbol;
            [pair.base_asset, pair.quote_asset].map(|leg| {
                let mut balance =
                    Balance::new(AccountType::IsolatedMargin, leg.asset, leg.free, leg.locked);
                balance.isolated_symbol = Some(symbol.clone());
                balance
            })
        })
        .collect()
}

fn futures_balance(asset: FuturesAsset) -> Balance {
    let ceiling = asset.wallet_balance.max(Decimal::ZERO);
    let free = asset.max_withdraw_amount.max(Decimal::ZERO).min(ceiling);
    let locked = (asset.wallet_balance - free).max(Decimal::ZERO);
    Balance::new(AccountType::Futures, asset.asset, free, locked)
}

fn funding_balance(asset: FundingAsset) -> Balance {
    let locked = asset.locked + asset.freeze + asset.withdrawing;
    Balance::new(AccountType::Funding, asset.asset, asset.free, locked)
}

pub fn is_usd_stablecoin(asset: &str) -> bool {
    USD_STABLECOINS.contains(&asset)
}

/// Fill `usd_value` from a full ticker list.
///
/// Stablecoins count at par; other assets need a `<ASSET>USDT` ticker and are
/// left unpriced without one.
pub fn apply_usd_prices(balances: &mut [Balance], tickers: &[TickerPrice]) {
    let prices: HashMap<&str, Decimal> = tickers
        .iter()
        .map(|t| (t.symbol.as_str(), t.price))
        .collect();

    for balance in balances {
        let price = if is_usd_stablecoin(&balance.asset) {
            Some(Decimal::ONE)
        } else {
            let symbol = format!("{}{}", balance.asset, PRICING_QUOTE);
            prices.get(symbol.as_str()).copied()
        };
        balance.usd_value = price.map(|p| balance.total() * p);
    }
}
