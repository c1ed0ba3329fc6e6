use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::session::{
    SessionClaims, new_session_header, prepare_logout_response, session_token_from_headers,
    validate_session_token,
};

use super::errors::CoordinationError;

/// Request body for the session bridge used by non-passkey logins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreateRequest {
    pub user_id: String,
    pub email: String,
}

/// Mint a session for a user who authenticated outside the passkey flow
/// (the application's password login). Returns the Set-Cookie headers.
pub fn create_session_core(request: SessionCreateRequest) -> Result<HeaderMap, CoordinationError> {
    if request.user_id.trim().is_empty() || request.email.trim().is_empty() {
        return Err(
            CoordinationError::InvalidRequest("userId and email are required".to_string()).log(),
        );
    }

    tracing::debug!("Bridging non-passkey login for user {}", request.user_id);

    Ok(new_session_header(&request.user_id, "password")?)
}

/// Clear the session cookie. Stateless tokens cannot be revoked
/// server-side; other holders of the token keep it until expiry.
pub fn logout_core() -> Result<HeaderMap, CoordinationError> {
    Ok(prepare_logout_response()?)
}

/// Resolve the session claims for a request, or fail `Unauthorized`.
///
/// Every validation failure collapses to the same `Unauthorized` answer:
/// a caller probing this endpoint learns nothing about why a token was
/// rejected.
pub fn authenticate_request_core(headers: &HeaderMap) -> Result<SessionClaims, CoordinationError> {
    let token = session_token_from_headers(headers)
        .map_err(|_| CoordinationError::Unauthorized)?
        .ok_or(CoordinationError::Unauthorized)?;

    validate_session_token(token).map_err(|e| {
        tracing::debug!("Session token rejected: {}", e);
        CoordinationError::Unauthorized
    })
}
