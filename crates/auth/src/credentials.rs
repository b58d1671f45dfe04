//! Secure API credential management.
//!
//! Uses the `secrecy` crate to prevent accidental logging of secret keys
//! and ensures memory is zeroed on drop.

use crate::error::CredentialError;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the API key.
const API_KEY_VAR: &str = "BINANCE_API_KEY";

/// Environment variables holding the secret, in lookup order.
const SECRET_VARS: [&str; 2] = ["BINANCE_API_SECRET", "BINANCE_SECRET_KEY"];

/// API credentials for authenticated requests.
///
/// The secret key is wrapped in `SecretString` which:
/// - Prevents accidental Debug/Display printing
/// - Zeros memory on drop via zeroize
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret_key: SecretString,
}

impl ApiCredentials {
    /// Load credentials through an environment-style variable lookup.
    ///
    /// Looks for:
    /// - `BINANCE_API_KEY` - The API key (public)
    /// - `BINANCE_API_SECRET` - The secret key (`BINANCE_SECRET_KEY` is accepted as well)
    ///
    /// Public market data works without keys, so `Ok(None)` is returned when
    /// neither variable is set. Setting only one of them is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR);
        let secret_key = SECRET_VARS.iter().find_map(|name| lookup(name));

        match (api_key, secret_key) {
            (Some(api_key), Some(secret_key)) => Self::try_new(api_key, secret_key).map(Some),
            (None, None) => Ok(None),
            (Some(_), None) => Err(CredentialError::MissingEnvVar(SECRET_VARS[0].into())),
            (None, Some(_)) => Err(CredentialError::MissingEnvVar(API_KEY_VAR.into())),
        }
    }

    /// Create credentials from explicit values.
    ///
    /// Useful for testing or when credentials come from other sources.
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: SecretString::from(secret_key),
        }
    }

    /// Create credentials, rejecting blank values or values containing whitespace.
    pub fn try_new(api_key: String, secret_key: String) -> Result<Self, CredentialError> {
        if !is_well_formed(&api_key) {
            return Err(CredentialError::InvalidKeyFormat("API key"));
        }
        if !is_well_formed(&secret_key) {
            return Err(CredentialError::InvalidKeyFormat("API secret"));
        }
        Ok(Self::new(api_key, secret_key))
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Expose the secret key for signing.
    ///
    /// **WARNING**: Only use this for cryptographic operations.
    /// Never log or display the return value.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn is_well_formed(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = ApiCredentials::new("my_api_key".into(), "my_secret".into());
        assert_eq!(creds.api_key(), "my_api_key");
        assert_eq!(creds.expose_secret(), "my_secret");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ApiCredentials::new("my_api_key".into(), "super_secret_key".into());
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("my_api_key"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_lookup() {
        let lookup = |name: &str| match name {
            "BINANCE_API_KEY" => Some("key".to_string()),
            "BINANCE_SECRET_KEY" => Some("secret".to_string()),
            _ => None,
        };
        let creds = ApiCredentials::from_lookup(lookup).unwrap().unwrap();
        assert_eq!(creds.expose_secret(), "secret");

        assert!(ApiCredentials::from_lookup(|_: &str| None).unwrap().is_none());

        let err = ApiCredentials::from_lookup(|name: &str| {
            (name == "BINANCE_API_KEY").then(|| "key".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, CredentialError::MissingEnvVar(ref var) if var == "BINANCE_API_SECRET"));
    }

    #[test]
    fn test_try_new_rejects_blank_secret() {
        let err = ApiCredentials::try_new("key".into(), "".into()).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidKeyFormat("API secret")));
    }

    #[test]
    fn test_try_new_rejects_whitespace_in_key() {
        let err = ApiCredentials::try_new("my key".into(), "secret".into()).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidKeyFormat("API key")));
    }
}
