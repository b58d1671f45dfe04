use thiserror::Error;

/// Errors that can occur while loading or validating API credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The API key or secret is empty or contains whitespace.
    #[error("Invalid {0} format")]
    InvalidKeyFormat(&'static str),
}
