use thiserror::Error;

use crate::passkey::PasskeyError;
use crate::session::SessionError;
use crate::utils::UtilError;

/// Errors surfaced by the coordination layer, the boundary the HTTP
/// integration maps onto status codes.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// The request is missing or malforms required fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No valid session accompanies a request that needs one
    #[error("Unauthorized access")]
    Unauthorized,

    /// The caller is authenticated but does not own the resource
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found with context
    #[error("Resource not found: {resource_type} {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Error from passkey ceremony or storage operations
    #[error("Passkey error: {0}")]
    Passkey(PasskeyError),

    /// Error from session operations
    #[error("Session error: {0}")]
    Session(SessionError),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(UtilError),
}

impl CoordinationError {
    /// Log the error and return self, allowing call sites to chain
    /// `.log()` where the failure should be recorded.
    pub fn log(self) -> Self {
        match &self {
            Self::InvalidRequest(msg) => tracing::debug!("Invalid request: {}", msg),
            Self::Unauthorized => tracing::debug!("Unauthorized access"),
            Self::Forbidden => tracing::warn!("Forbidden access attempt"),
            Self::ResourceNotFound {
                resource_type,
                resource_id,
            } => tracing::debug!("Resource not found: {} {}", resource_type, resource_id),
            Self::Passkey(err) => tracing::error!("Passkey error: {}", err),
            Self::Session(err) => tracing::error!("Session error: {}", err),
            Self::Utils(err) => tracing::error!("Utils error: {}", err),
        }
        self
    }
}

// From impls log automatically: ceremony failures always leave a trace
// server-side even though the caller only sees a generic message.

impl From<PasskeyError> for CoordinationError {
    fn from(err: PasskeyError) -> Self {
        let error = Self::Passkey(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        let error = Self::Session(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        let error = Self::Utils(err);
        tracing::error!("{}", error);
        error
    }
}
