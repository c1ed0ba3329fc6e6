use thiserror::Error;

use crate::utils::UtilError;

/// Errors that can occur during WebAuthn/Passkey operations.
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// Error related to passkey configuration (e.g., invalid RP ID or origin)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error with the cryptographic challenge used in the WebAuthn protocol
    #[error("Invalid challenge: {0}")]
    Challenge(String),

    /// The challenge outlived its TTL; it has been deleted and cannot be reused
    #[error("Expired: {0}")]
    Expired(String),

    /// A requested resource (challenge or credential) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A credential id collided with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The signature counter did not advance; possible credential cloning
    #[error("Counter regression: stored {stored}, received {received}")]
    CounterRegression { stored: u32, received: u32 },

    /// Error during the registration ceremony
    #[error("Registration error: {0}")]
    Registration(String),

    /// Error during the authentication ceremony
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Error during cryptographic verification of WebAuthn responses
    #[error("Verification error: {0}")]
    Verification(String),

    /// Error validating the client data JSON from the browser
    #[error("Invalid client data: {0}")]
    ClientData(String),

    /// Error parsing or validating the authenticator data structure
    #[error("Invalid authenticator data: {0}")]
    AuthenticatorData(String),

    /// Error with improperly formatted data
    #[error("Invalid format: {0}")]
    Format(String),

    /// Error in cryptographic operations
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error accessing or modifying stored passkey data
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    /// Error from JSON serialization/deserialization
    #[error("Serde error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
