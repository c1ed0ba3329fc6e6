use ring::{digest, signature::UnparsedPublicKey};

use super::challenge::{create_challenge, get_and_validate_challenge, remove_challenge};
use super::types::{
    AuthenticationOptions, AuthenticatorData, AuthenticatorResponse, CredentialDescriptor,
    ParsedClientData,
};

use crate::passkey::config::{
    PASSKEY_ALLOW_ZERO_COUNTER, PASSKEY_RP_ID, PASSKEY_TIMEOUT, PASSKEY_USER_VERIFICATION,
};
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::CredentialStore;
use crate::passkey::types::{ChallengeKind, CredentialSearchField, PasskeyCredential};

use crate::utils::base64url_decode;

/// Build request options and persist the ceremony challenge.
///
/// With a user id, the allow-list is populated from that user's
/// credentials; without one it stays empty, accepting any discoverable
/// credential.
pub(crate) async fn start_authentication(
    user_id: Option<&str>,
) -> Result<AuthenticationOptions, PasskeyError> {
    let mut allow_credentials = Vec::new();
    if let Some(user_id) = user_id {
        let credentials =
            CredentialStore::get_credentials_by(CredentialSearchField::UserId(user_id.to_string()))
                .await?;

        for credential in credentials {
            allow_credentials.push(CredentialDescriptor {
                type_: "public-key".to_string(),
                id: credential.credential_id,
            });
        }
    }

    let (ceremony_id, challenge) = create_challenge(ChallengeKind::Authentication, None).await?;

    let options = AuthenticationOptions {
        challenge,
        timeout: (*PASSKEY_TIMEOUT) * 1000, // Convert seconds to milliseconds
        rp_id: PASSKEY_RP_ID.to_string(),
        allow_credentials,
        user_verification: PASSKEY_USER_VERIFICATION.to_string(),
        ceremony_id,
    };

    tracing::debug!("Authentication options: {:?}", options);

    Ok(options)
}

/// Verify an assertion response against the stored credential.
///
/// On success the credential's counter and last-used timestamp are
/// updated (compare-and-set) and the challenge is deleted. On failure no
/// state is mutated: the challenge stays until its TTL so the client may
/// retry within the window.
///
/// Returns `(user_id, new_counter)`.
pub(crate) async fn finish_authentication(
    auth_response: &AuthenticatorResponse,
) -> Result<(String, u32), PasskeyError> {
    let stored =
        get_and_validate_challenge(ChallengeKind::Authentication, &auth_response.ceremony_id)
            .await?;

    let client_data = ParsedClientData::from_base64(&auth_response.response.client_data_json)?;
    client_data.verify("webauthn.get", &stored.challenge)?;

    let auth_data = AuthenticatorData::from_base64(&auth_response.response.authenticator_data)?;
    auth_data.verify()?;

    let credential = CredentialStore::get_credentials_by(CredentialSearchField::CredentialId(
        auth_response.id.clone(),
    ))
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| {
        tracing::warn!("Credential not found: {}", auth_response.id);
        PasskeyError::NotFound("Credential not found".to_string())
    })?;

    verify_user_handle(auth_response, &credential)?;
    verify_signature(auth_response, &client_data, &auth_data, &credential)?;

    let new_counter = check_counter(credential.counter, auth_data.counter)?;

    // Compare-and-set against the counter we verified: a concurrent
    // authentication that advanced it first must surface as a regression,
    // not be silently absorbed.
    CredentialStore::update_counter(&credential.credential_id, credential.counter, new_counter)
        .await?;

    remove_challenge(ChallengeKind::Authentication, &auth_response.ceremony_id).await?;

    tracing::info!(
        "Authenticated user {} with credential {}",
        credential.user_id,
        credential.id
    );

    Ok((credential.user_id, new_counter))
}

/// When the client supplies a user handle it must match the one minted at
/// registration; absent handles are allowed for non-discoverable flows.
fn verify_user_handle(
    auth_response: &AuthenticatorResponse,
    credential: &PasskeyCredential,
) -> Result<(), PasskeyError> {
    if let Some(handle) = auth_response.response.user_handle.as_deref() {
        if !handle.is_empty() && handle != credential.user_id {
            tracing::warn!(
                "User handle mismatch for credential {}",
                credential.credential_id
            );
            return Err(PasskeyError::Authentication(
                "User handle mismatch".to_string(),
            ));
        }
    }
    Ok(())
}

/// Counter acceptance policy.
///
/// A strictly increasing counter is accepted. Authenticators that never
/// implement a counter report zero forever; the 0 -> 0 transition is
/// accepted only while the configured exception allows it. Every other
/// non-increasing transition signals possible credential cloning. The
/// decision to disable the credential is the caller's, not this
/// function's.
fn check_counter(stored: u32, received: u32) -> Result<u32, PasskeyError> {
    check_counter_with_policy(stored, received, *PASSKEY_ALLOW_ZERO_COUNTER)
}

fn check_counter_with_policy(
    stored: u32,
    received: u32,
    allow_zero: bool,
) -> Result<u32, PasskeyError> {
    if received > stored {
        return Ok(received);
    }

    if stored == 0 && received == 0 && allow_zero {
        tracing::debug!("Authenticator without counter support (0 -> 0 accepted)");
        return Ok(0);
    }

    tracing::warn!(
        "Counter regression detected: stored {}, received {}",
        stored,
        received
    );
    Err(PasskeyError::CounterRegression { stored, received })
}

/// Verify the assertion signature over `authData || SHA-256(clientDataJSON)`
/// with the stored public key.
fn verify_signature(
    auth_response: &AuthenticatorResponse,
    client_data: &ParsedClientData,
    auth_data: &AuthenticatorData,
    credential: &PasskeyCredential,
) -> Result<(), PasskeyError> {
    let public_key = base64url_decode(&credential.public_key)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key: {e}")))?;

    let unparsed_public_key =
        UnparsedPublicKey::new(&ring::signature::ECDSA_P256_SHA256_ASN1, &public_key);

    let signature = base64url_decode(&auth_response.response.signature)
        .map_err(|e| PasskeyError::Format(format!("Invalid signature: {e}")))?;

    let client_data_hash = digest::digest(&digest::SHA256, &client_data.raw_data);
    let mut signed_data =
        Vec::with_capacity(auth_data.raw_data.len() + client_data_hash.as_ref().len());
    signed_data.extend_from_slice(&auth_data.raw_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    unparsed_public_key
        .verify(&signed_data, &signature)
        .map_err(|_| {
            tracing::warn!(
                "Assertion signature verification failed for credential {}",
                credential.credential_id
            );
            PasskeyError::Verification("Signature verification failed".to_string())
        })
}
