//! Request parameters and typed query builders.

/// Ordered request parameters.
///
/// Order is preserved into the signed query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, replacing an earlier value with the same name.
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some(existing) => existing.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
        self
    }

    /// Append a parameter only when a value is present.
    pub fn with_opt<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    /// Borrowed pairs for the signer and encoder.
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }
}

/// Exchange symbols and coins are upper-case.
pub(crate) fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Filters for deposit and withdrawal history.
#[derive(Debug, Clone)]
pub struct TransferQuery {
    pub coin: Option<String>,
    /// Exchange status code filter.
    pub status: Option<u8>,
    pub limit: u32,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl Default for TransferQuery {
    fn default() -> Self {
        Self {
            coin: None,
            status: None,
            limit: 10,
            start_time: None,
            end_time: None,
        }
    }
}

impl TransferQuery {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn coin(mut self, coin: &str) -> Self {
        self.coin = Some(normalize_symbol(coin));
        self
    }

    pub fn status(mut self, status: u8) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn between(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with_opt("coin", self.coin.as_deref().map(normalize_symbol))
            .with_opt("status", self.status)
            .with_opt("startTime", self.start_time)
            .with_opt("endTime", self.end_time)
            .with("limit", self.limit.clamp(1, Self::MAX_LIMIT))
    }
}

/// Filters for futures income history.
#[derive(Debug, Clone)]
pub struct IncomeQuery {
    pub symbol: Option<String>,
    /// e.g. `REALIZED_PNL`, `FUNDING_FEE`, `COMMISSION`.
    pub income_type: Option<String>,
    pub limit: u32,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl Default for IncomeQuery {
    fn default() -> Self {
        Self {
            symbol: None,
            income_type: None,
            limit: 20,
            start_time: None,
            end_time: None,
        }
    }
}

impl IncomeQuery {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(normalize_symbol(symbol));
        self
    }

    pub fn income_type(mut self, income_type: &str) -> Self {
        self.income_type = Some(income_type.trim().to_uppercase());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn between(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with_opt("symbol", self.symbol.as_deref().map(normalize_symbol))
            .with_opt("incomeType", self.income_type.as_deref())
            .with_opt("startTime", self.start_time)
            .with_opt("endTime", self.end_time)
            .with("limit", self.limit.clamp(1, Self::MAX_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_keep_insertion_order() {
        let params = Params::new()
            .with("symbol", "BTCUSDT")
            .with("limit", 5)
            .with_opt("fromId", None::<u64>)
            .with("symbol", "ETHUSDT");

        assert_eq!(params.as_pairs(), vec![("symbol", "ETHUSDT"), ("limit", "5")]);
        assert!(!params.contains("fromId"));
    }

    #[test]
    fn test_transfer_query_params() {
        let params = TransferQuery::default()
            .coin("usdt")
            .status(1)
            .limit(5000)
            .to_params();

        assert_eq!(params.get("coin"), Some("USDT"));
        assert_eq!(params.get("status"), Some("1"));
        assert_eq!(params.get("limit"), Some("1000"));
        assert!(!params.contains("startTime"));
    }

    #[test]
    fn test_transfer_query_lowercase_field_is_normalized() {
        let query = TransferQuery {
            coin: Some("btc".into()),
            ..TransferQuery::default()
        };
        assert_eq!(query.to_params().get("coin"), Some("BTC"));
        assert_eq!(query.to_params().get("limit"), Some("10"));
    }

    #[test]
    fn test_income_query_params() {
        let params = IncomeQuery::default()
            .symbol("ethusdt")
            .income_type("funding_fee")
            .between(1_000, 2_000)
            .to_params();

        assert_eq!(
            params.as_pairs(),
            vec![
                ("symbol", "ETHUSDT"),
                ("incomeType", "FUNDING_FEE"),
                ("startTime", "1000"),
                ("endTime", "2000"),
                ("limit", "20"),
            ]
        );
    }
}
