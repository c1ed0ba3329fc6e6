use http::HeaderMap;
use http::header::COOKIE;

use crate::session::config::{SESSION_COOKIE_NAME, SESSION_COOKIE_SECURE, SESSION_MAX_AGE};
use crate::session::errors::SessionError;
use crate::utils::header_set_cookie;

use super::token::mint_session_token;

/// Mint a session token for `user_id` and wrap it in a Set-Cookie header.
pub(crate) fn new_session_header(
    user_id: &str,
    auth_method: &str,
) -> Result<HeaderMap, SessionError> {
    let token = mint_session_token(user_id, auth_method)?;

    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        SESSION_COOKIE_NAME.as_str(),
        &token,
        *SESSION_MAX_AGE as i64,
        *SESSION_COOKIE_SECURE,
    )?;

    tracing::debug!("Created session cookie for user {}", user_id);
    Ok(headers)
}

/// Clear the session cookie.
///
/// Logout is purely client-side: tokens already issued remain valid on
/// other clients until they expire.
pub fn prepare_logout_response() -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        SESSION_COOKIE_NAME.as_str(),
        "",
        0,
        *SESSION_COOKIE_SECURE,
    )?;
    Ok(headers)
}

/// Extract the session token from a request's Cookie header, if present.
pub fn session_token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, SessionError> {
    let Some(cookie_header) = headers.get(COOKIE) else {
        tracing::debug!("No cookie header found");
        return Ok(None);
    };

    let cookie_str = cookie_header.to_str().map_err(|e| {
        tracing::error!("Invalid cookie header: {}", e);
        SessionError::Header("Invalid cookie header".to_string())
    })?;

    let cookie_name = SESSION_COOKIE_NAME.as_str();
    let token = cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
        let mut parts = s.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(k), Some(v)) if k == cookie_name => Some(v),
            _ => None,
        }
    });

    if token.is_none() {
        tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
    }

    Ok(token)
}
