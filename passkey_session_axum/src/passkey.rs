use axum::{
    Json,
    routing::{Router, delete, get, post},
};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use passkey_session::{
    AuthenticationOptions, AuthenticatorResponse, RegistrationOptions, RegistrationStartRequest,
    RegistrationVerifyRequest, delete_passkey_credential_core, handle_finish_authentication_core,
    handle_finish_registration_core, handle_start_authentication_core,
    handle_start_registration_core, list_credentials_core,
};

use crate::error::IntoResponseError;
use crate::session::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/register/start", post(start_registration))
        .route("/register/verify", post(verify_registration))
        .route("/authenticate/start", post(start_authentication))
        .route("/authenticate/verify", post(verify_authentication))
        .route("/list", get(list_passkeys))
        .route("/delete", delete(delete_passkey))
}

async fn start_registration(
    Json(request): Json<RegistrationStartRequest>,
) -> Result<Json<RegistrationOptions>, (StatusCode, String)> {
    let options = handle_start_registration_core(request)
        .await
        .into_response_error()?;
    Ok(Json(options))
}

async fn verify_registration(
    Json(request): Json<RegistrationVerifyRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    handle_finish_registration_core(request)
        .await
        .into_response_error()?;
    Ok(Json(json!({ "verified": true })))
}

async fn start_authentication() -> Result<Json<AuthenticationOptions>, (StatusCode, String)> {
    let options = handle_start_authentication_core(None)
        .await
        .into_response_error()?;
    Ok(Json(options))
}

/// Successful verification sets the session cookie alongside the body.
async fn verify_authentication(
    Json(response): Json<AuthenticatorResponse>,
) -> Result<(HeaderMap, Json<Value>), (StatusCode, String)> {
    let (user_id, _, headers) = handle_finish_authentication_core(response)
        .await
        .into_response_error()?;
    Ok((headers, Json(json!({ "verified": true, "userId": user_id }))))
}

async fn list_passkeys(user: AuthUser) -> Result<Json<Value>, (StatusCode, String)> {
    let passkeys = list_credentials_core(&user.user_id)
        .await
        .into_response_error()?;
    Ok(Json(json!({ "passkeys": passkeys })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePasskeyRequest {
    passkey_id: String,
}

async fn delete_passkey(
    user: AuthUser,
    Json(request): Json<DeletePasskeyRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    delete_passkey_credential_core(&user.user_id, &request.passkey_id)
        .await
        .into_response_error()?;
    Ok(Json(json!({ "success": true })))
}
