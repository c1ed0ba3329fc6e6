use axum::{
    Json, RequestPartsExt,
    extract::{FromRequestParts, OptionalFromRequestParts},
    routing::{Router, post},
};
use axum_extra::{TypedHeader, headers};
use http::{HeaderMap, StatusCode, request::Parts};
use serde_json::{Value, json};

use passkey_session::{
    SESSION_COOKIE_NAME, SessionCreateRequest, create_session_core, logout_core,
    validate_session_token,
};

use crate::error::IntoResponseError;

pub fn router() -> Router {
    Router::new().route("/create", post(create_session).delete(destroy_session))
}

/// Authenticated user resolved from the session cookie, available as an
/// axum extractor. Handlers taking an `AuthUser` reject unauthenticated
/// requests with 401 before running.
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Authenticated user id (the token's subject)
    pub user_id: String,
    /// How the session was established ("passkey" or "password")
    pub auth_method: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || (StatusCode::UNAUTHORIZED, "Unauthorized".to_string());

        let cookies: TypedHeader<headers::Cookie> = parts.extract().await.map_err(|_| {
            tracing::debug!("Failed to extract cookies");
            unauthorized()
        })?;

        let token = cookies.get(SESSION_COOKIE_NAME.as_str()).ok_or_else(|| {
            tracing::debug!("No session cookie present");
            unauthorized()
        })?;

        let claims = validate_session_token(token).map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            unauthorized()
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            auth_method: claims.auth_method,
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}

/// Bridge endpoint for non-passkey logins: mints the same session cookie
/// the passkey flow sets.
async fn create_session(
    Json(request): Json<SessionCreateRequest>,
) -> Result<(HeaderMap, Json<Value>), (StatusCode, String)> {
    let headers = create_session_core(request).into_response_error()?;
    Ok((headers, Json(json!({ "success": true }))))
}

/// Logout: clears the cookie. Tokens held elsewhere stay valid until
/// expiry.
async fn destroy_session() -> Result<(HeaderMap, Json<Value>), (StatusCode, String)> {
    let headers = logout_core().into_response_error()?;
    Ok((headers, Json(json!({ "success": true }))))
}
