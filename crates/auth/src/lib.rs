//! Credentials and request signing for the Binance REST API.
//!
//! - **Secure Credentials**: API secrets are wrapped in `SecretString` to prevent
//!   accidental logging and ensure memory is zeroed on drop.
//! - **HMAC-SHA256 Signing**: Builds the canonical query string and signs it the
//!   way Binance `USER_DATA` endpoints expect.
//! - **Environment Loading**: Credentials can be read through any variable lookup,
//!   `std::env::var` included.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::{ApiCredentials, RequestSigner};
//!
//! let credentials = ApiCredentials::from_lookup(|name| std::env::var(name).ok())?
//!     .expect("credentials configured");
//! let signer = RequestSigner::new(&credentials);
//!
//! let params = [("symbol", "BTCUSDT"), ("limit", "10")];
//! let signed_query = signer.sign_params(&params, timestamp_ms, Some(5000));
//! ```

mod credentials;
mod error;
mod signer;

pub use credentials::ApiCredentials;
pub use error::CredentialError;
pub use signer::{canonical_query, RequestSigner};
