use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::passkey::{
    AuthenticationOptions, AuthenticatorResponse, CredentialSearchField, CredentialStore,
    PasskeyCredential, PasskeyInfo, RegisterCredential, RegistrationOptions,
    finish_authentication, finish_registration, start_authentication, start_registration,
};
use crate::session::new_session_header;

use super::errors::CoordinationError;

/// Request body for starting passkey registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStartRequest {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}

/// Request body for finishing passkey registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationVerifyRequest {
    pub user_id: String,
    pub response: RegisterCredential,
}

/// Start a registration ceremony for an identified user.
pub async fn handle_start_registration_core(
    request: RegistrationStartRequest,
) -> Result<RegistrationOptions, CoordinationError> {
    if request.user_id.trim().is_empty()
        || request.email.trim().is_empty()
        || request.display_name.trim().is_empty()
    {
        return Err(CoordinationError::InvalidRequest(
            "userId, email and displayName are required".to_string(),
        )
        .log());
    }

    let options =
        start_registration(&request.user_id, &request.email, &request.display_name).await?;
    Ok(options)
}

/// Verify an attestation response and persist the new credential.
pub async fn handle_finish_registration_core(
    request: RegistrationVerifyRequest,
) -> Result<PasskeyCredential, CoordinationError> {
    if request.user_id.trim().is_empty() {
        return Err(CoordinationError::InvalidRequest("userId is required".to_string()).log());
    }

    let credential = finish_registration(&request.user_id, &request.response).await?;
    Ok(credential)
}

/// Start an authentication ceremony. A user id narrows the allow-list;
/// without one any discoverable credential may answer.
pub async fn handle_start_authentication_core(
    user_id: Option<&str>,
) -> Result<AuthenticationOptions, CoordinationError> {
    Ok(start_authentication(user_id).await?)
}

/// Verify an assertion response, then mint the session that represents
/// the login. Returns the user id, the credential's new counter, and the
/// Set-Cookie headers.
pub async fn handle_finish_authentication_core(
    auth_response: AuthenticatorResponse,
) -> Result<(String, u32, HeaderMap), CoordinationError> {
    let (user_id, new_counter) = finish_authentication(&auth_response).await?;

    let headers = new_session_header(&user_id, "passkey")?;

    Ok((user_id, new_counter, headers))
}

/// List a user's credentials, newest first, with key material stripped.
pub async fn list_credentials_core(user_id: &str) -> Result<Vec<PasskeyInfo>, CoordinationError> {
    let credentials =
        CredentialStore::get_credentials_by(CredentialSearchField::UserId(user_id.to_string()))
            .await?;

    Ok(credentials.into_iter().map(PasskeyInfo::from).collect())
}

/// Delete one of the caller's credentials.
///
/// Existence is checked before ownership so a caller can distinguish "no
/// such passkey" from "not yours"; only the owner ever reaches the
/// delete. No minimum credential count is enforced.
pub async fn delete_passkey_credential_core(
    user_id: &str,
    passkey_id: &str,
) -> Result<(), CoordinationError> {
    let credential = CredentialStore::find_credential(CredentialSearchField::Id(
        passkey_id.to_string(),
    ))
    .await?
    .ok_or_else(|| {
        CoordinationError::ResourceNotFound {
            resource_type: "Passkey".to_string(),
            resource_id: passkey_id.to_string(),
        }
        .log()
    })?;

    if credential.user_id != user_id {
        return Err(CoordinationError::Forbidden.log());
    }

    CredentialStore::delete_credential(&credential.id).await?;

    tracing::info!("Deleted credential {} for user {}", passkey_id, user_id);

    Ok(())
}
