use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The token signature does not verify under the process secret
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token's expiry has passed
    #[error("Session token expired")]
    Expired,

    /// The token could not be parsed at all
    #[error("Malformed session token: {0}")]
    TokenFormat(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Header error: {0}")]
    Header(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}
