//! Normalized account types shared by the REST core and its callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the exchange's segregated balance pools.
///
/// The declaration order is the order balances appear in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Spot,
    CrossMargin,
    IsolatedMargin,
    Futures,
    Funding,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Spot,
        AccountType::CrossMargin,
        AccountType::IsolatedMargin,
        AccountType::Futures,
        AccountType::Funding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::CrossMargin => "cross_margin",
            Self::IsolatedMargin => "isolated_margin",
            Self::Futures => "futures",
            Self::Funding => "funding",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "spot" => Ok(Self::Spot),
            "cross_margin" | "margin" | "cross" => Ok(Self::CrossMargin),
            "isolated_margin" | "isolated" => Ok(Self::IsolatedMargin),
            "futures" | "usdm" | "fapi" => Ok(Self::Futures),
            "funding" => Ok(Self::Funding),
            other => Err(format!("unknown account type '{}'", other)),
        }
    }
}

/// A single asset balance in one account type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub account_type: AccountType,
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    /// Estimated USD value of `free + locked`, when a price was available.
    pub usd_value: Option<Decimal>,
    /// Trading pair for isolated margin balances.
    pub isolated_symbol: Option<String>,
}

impl Balance {
    pub fn new(account_type: AccountType, asset: impl Into<String>, free: Decimal, locked: Decimal) -> Self {
        Self {
            account_type,
            asset: asset.into(),
            free,
            locked,
            usd_value: None,
            isolated_symbol: None,
        }
    }

    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }

    pub fn is_zero(&self) -> bool {
        self.free.is_zero() && self.locked.is_zero()
    }
}

/// Outcome of fetching one account type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Failed {
        /// Error category, e.g. `AuthError`.
        kind: String,
        reason: String,
    },
}

impl FetchStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Failed { kind, reason } => write!(f, "error: {}: {}", kind, reason),
        }
    }
}

/// Merged view of balances across the queried account types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Ordered by account type, then in the exchange's order within a type.
    pub balances: Vec<Balance>,
    /// One entry per requested account type.
    pub statuses: BTreeMap<AccountType, FetchStatus>,
    pub taken_at_ms: i64,
}

impl PortfolioSnapshot {
    /// True only if every requested account type was fetched without error.
    pub fn is_complete(&self) -> bool {
        self.statuses.values().all(FetchStatus::is_ok)
    }

    pub fn balances_for(&self, account_type: AccountType) -> impl Iterator<Item = &Balance> {
        self.balances
            .iter()
            .filter(move |b| b.account_type == account_type)
    }

    pub fn failed_types(&self) -> Vec<AccountType> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.is_ok())
            .map(|(account_type, _)| *account_type)
            .collect()
    }

    /// Sum of all known USD values; `None` if no balance was priced.
    pub fn total_usd_value(&self) -> Option<Decimal> {
        self.balances
            .iter()
            .filter_map(|b| b.usd_value)
            .fold(None, |acc, v| Some(acc.unwrap_or_default() + v))
    }
}

impl fmt::Display for PortfolioSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statuses: Vec<String> = self
            .statuses
            .iter()
            .map(|(account_type, status)| format!("{}: {}", account_type, status))
            .collect();
        writeln!(f, "{}", statuses.join(", "))?;

        for balance in &self.balances {
            write!(
                f,
                "{:<16} {:<10} free={} locked={}",
                balance.account_type, balance.asset, balance.free, balance.locked
            )?;
            if let Some(symbol) = &balance.isolated_symbol {
                write!(f, " pair={}", symbol)?;
            }
            if let Some(usd) = balance.usd_value {
                write!(f, " usd={}", usd.round_dp(2))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
