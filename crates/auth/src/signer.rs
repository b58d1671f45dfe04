//! HMAC-SHA256 request signing for Binance API.
//!
//! The signature covers exactly the query string that is sent, so parameter
//! order only has to be stable between signing and sending. Parameters keep
//! their insertion order, followed by `recvWindow` and `timestamp`.

use crate::credentials::ApiCredentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// URL-encode parameters in insertion order (`application/x-www-form-urlencoded`).
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(params).expect("string pairs always encode")
}

/// Request signer for authenticated Binance API calls.
pub struct RequestSigner<'a> {
    credentials: &'a ApiCredentials,
}

impl<'a> RequestSigner<'a> {
    /// Create a new request signer with the given credentials.
    pub fn new(credentials: &'a ApiCredentials) -> Self {
        Self { credentials }
    }

    /// Sign a message and return the hex-encoded signature.
    ///
    /// This computes HMAC-SHA256 of the message using the secret key
    /// and returns the result as a lowercase hex string.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(message.as_bytes());
        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }

    /// Build a signed query string from parameters.
    ///
    /// Appends `recvWindow` (when given) and `timestamp` after the caller's
    /// parameters, encodes everything in that order, signs the encoded string
    /// and appends `signature` last.
    ///
    /// # Arguments
    /// * `params` - Key-value pairs to include in the query string
    /// * `timestamp_ms` - Server-adjusted timestamp in milliseconds
    /// * `recv_window_ms` - Optional receive window
    ///
    /// # Returns
    /// A complete query string with signature appended
    pub fn sign_params(
        &self,
        params: &[(&str, &str)],
        timestamp_ms: i64,
        recv_window_ms: Option<u64>,
    ) -> String {
        let recv_window = recv_window_ms.map(|w| w.to_string());
        let timestamp = timestamp_ms.to_string();

        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        if let Some(window) = recv_window.as_deref() {
            all_params.push(("recvWindow", window));
        }
        all_params.push(("timestamp", &timestamp));

        self.sign_encoded(canonical_query(&all_params))
    }

    fn sign_encoded(&self, query_string: String) -> String {
        let signature = self.sign(&query_string);
        format!("{}&signature={}", query_string, signature)
    }
}
