//! Binance environment configuration.
//!
//! Supports production and testnet environments with appropriate URLs for
//! each API host.

use std::fmt;
use std::str::FromStr;

/// Binance environment (production or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinanceEnvironment {
    /// Production environment (real money).
    #[default]
    Production,
    /// Testnet environment (fake money for testing).
    Testnet,
}

/// The API hosts a request can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiHost {
    /// Spot, margin and wallet endpoints (`/api`, `/sapi`).
    Spot,
    /// USDT-margined futures endpoints (`/fapi`).
    Futures,
    /// Public website endpoints (`/bapi`), e.g. announcements.
    Web,
}

impl BinanceEnvironment {
    /// Spot REST API base URL.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.binance.com",
            Self::Testnet => "https://testnet.binance.vision",
        }
    }

    /// USDT-M futures REST API base URL.
    pub fn futures_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://fapi.binance.com",
            Self::Testnet => "https://testnet.binancefuture.com",
        }
    }

    /// Website API base URL. There is no testnet counterpart.
    pub fn web_base_url(&self) -> &'static str {
        "https://www.binance.com"
    }

    /// Base URL for the given host.
    pub fn base_url(&self, host: ApiHost) -> &'static str {
        match host {
            ApiHost::Spot => self.rest_base_url(),
            ApiHost::Futures => self.futures_base_url(),
            ApiHost::Web => self.web_base_url(),
        }
    }

    /// Returns true if this is the testnet environment.
    pub fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }
}

impl fmt::Display for BinanceEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for BinanceEnvironment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" | "mainnet" | "main" => Ok(Self::Production),
            "testnet" | "test" | "sandbox" => Ok(Self::Testnet),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

/// Error parsing environment string.
#[derive(Debug, Clone)]
pub struct ParseEnvironmentError(String);

impl fmt::Display for ParseEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid environment '{}', expected 'production' or 'testnet'",
            self.0
        )
    }
}

impl std::error::Error for ParseEnvironmentError {}
