use chrono::Utc;
use ciborium::value::Value as CborValue;
use uuid::Uuid;

use super::attestation::{extract_public_key_coords, verify_attestation};
use super::challenge::{create_challenge, get_and_validate_challenge, remove_challenge};
use super::types::{
    AttestationObject, AuthenticatorData, AuthenticatorSelection, CredentialDescriptor,
    ParsedClientData, PubKeyCredParam, PublicKeyCredentialUserEntity, RegisterCredential,
    RegistrationOptions, RelyingParty,
};

use crate::passkey::config::{
    PASSKEY_ALLOW_CREDENTIAL_OVERWRITE, PASSKEY_ATTESTATION, PASSKEY_AUTHENTICATOR_ATTACHMENT,
    PASSKEY_REQUIRE_RESIDENT_KEY, PASSKEY_RESIDENT_KEY, PASSKEY_RP_ID, PASSKEY_RP_NAME,
    PASSKEY_TIMEOUT, PASSKEY_USER_VERIFICATION,
};
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::CredentialStore;
use crate::passkey::types::{ChallengeKind, CredentialSearchField, PasskeyCredential};

use crate::utils::{base64url_decode, base64url_encode};

/// Build creation options and persist the ceremony challenge.
///
/// The caller guarantees the identity fields are non-empty; the returned
/// options embed the challenge and the ceremony id the client must echo
/// back in its attestation response.
pub(crate) async fn start_registration(
    user_id: &str,
    email: &str,
    display_name: &str,
) -> Result<RegistrationOptions, PasskeyError> {
    // Exclude the user's existing credentials so an authenticator refuses
    // to create a second passkey for the same account.
    let exclude_credentials = CredentialStore::get_credentials_by(CredentialSearchField::UserId(
        user_id.to_string(),
    ))
    .await?
    .into_iter()
    .map(|credential| CredentialDescriptor {
        type_: "public-key".to_string(),
        id: credential.credential_id,
    })
    .collect();

    let (ceremony_id, challenge) =
        create_challenge(ChallengeKind::Registration, Some(user_id.to_string())).await?;

    let options = RegistrationOptions {
        challenge,
        rp_id: PASSKEY_RP_ID.to_string(),
        rp: RelyingParty {
            name: PASSKEY_RP_NAME.to_string(),
            id: PASSKEY_RP_ID.to_string(),
        },
        user: PublicKeyCredentialUserEntity {
            // The opaque user id doubles as the WebAuthn user handle, so a
            // discoverable credential's assertion binds back to the account.
            user_handle: user_id.to_string(),
            name: email.to_string(),
            display_name: display_name.to_string(),
        },
        pub_key_cred_params: vec![PubKeyCredParam {
            type_: "public-key".to_string(),
            alg: -7, // ES256, the only algorithm the verifier accepts
        }],
        authenticator_selection: AuthenticatorSelection {
            authenticator_attachment: PASSKEY_AUTHENTICATOR_ATTACHMENT.to_string(),
            resident_key: PASSKEY_RESIDENT_KEY.to_string(),
            require_resident_key: *PASSKEY_REQUIRE_RESIDENT_KEY,
            user_verification: PASSKEY_USER_VERIFICATION.to_string(),
        },
        exclude_credentials,
        timeout: (*PASSKEY_TIMEOUT) * 1000, // Convert seconds to milliseconds
        attestation: PASSKEY_ATTESTATION.to_string(),
        ceremony_id,
    };

    tracing::debug!("Registration options: {:?}", options);

    Ok(options)
}

/// Outcome of verifying an attestation response, before persistence.
struct VerifiedRegistration {
    credential_id: String,
    public_key: String,
    counter: u32,
    credential_device_type: String,
    credential_backed_up: bool,
}

/// Verify an attestation response and persist the resulting credential.
///
/// The ceremony is single-use in every outcome: whether verification
/// succeeds, fails, or the credential id conflicts, the challenge is
/// consumed and the client must restart from the issuer.
pub(crate) async fn finish_registration(
    user_id: &str,
    reg_data: &RegisterCredential,
) -> Result<PasskeyCredential, PasskeyError> {
    let stored =
        get_and_validate_challenge(ChallengeKind::Registration, &reg_data.ceremony_id).await?;

    let verified = match verify_attestation_response(user_id, reg_data, &stored) {
        Ok(verified) => verified,
        Err(e) => {
            consume_challenge(&reg_data.ceremony_id).await;
            return Err(e);
        }
    };

    let now = Utc::now();
    let credential = PasskeyCredential {
        id: Uuid::new_v4().to_string(),
        credential_id: verified.credential_id,
        user_id: user_id.to_string(),
        public_key: verified.public_key,
        counter: verified.counter,
        credential_device_type: verified.credential_device_type,
        credential_backed_up: verified.credential_backed_up,
        device_name: derive_device_name(reg_data),
        transports: reg_data.response.transports.clone().unwrap_or_default(),
        created_at: now,
        last_used_at: now,
    };

    if let Err(e) =
        CredentialStore::store_credential(&credential, *PASSKEY_ALLOW_CREDENTIAL_OVERWRITE).await
    {
        consume_challenge(&reg_data.ceremony_id).await;
        return Err(e);
    }

    remove_challenge(ChallengeKind::Registration, &reg_data.ceremony_id).await?;

    tracing::info!(
        "Registered credential {} for user {}",
        credential.id,
        user_id
    );

    Ok(credential)
}

/// Best-effort challenge removal on a failure path; the failure being
/// reported matters more than the cleanup error.
async fn consume_challenge(ceremony_id: &str) {
    if let Err(e) = remove_challenge(ChallengeKind::Registration, ceremony_id).await {
        tracing::warn!("Failed to remove consumed challenge {}: {}", ceremony_id, e);
    }
}

fn verify_attestation_response(
    user_id: &str,
    reg_data: &RegisterCredential,
    stored: &crate::passkey::types::StoredChallenge,
) -> Result<VerifiedRegistration, PasskeyError> {
    if reg_data.type_ != "public-key" {
        return Err(PasskeyError::Format(format!(
            "Invalid credential type: {}",
            reg_data.type_
        )));
    }

    // The ceremony was started for a specific account; a response from any
    // other account is a mismatch, not a retry.
    if stored.user_id.as_deref() != Some(user_id) {
        return Err(PasskeyError::Registration(
            "Ceremony does not belong to this user".to_string(),
        ));
    }

    let client_data = ParsedClientData::from_base64(&reg_data.response.client_data_json)?;
    client_data.verify("webauthn.create", &stored.challenge)?;

    let attestation = parse_attestation_object(&reg_data.response.attestation_object)?;
    verify_attestation(&attestation, &client_data.raw_data)?;

    let auth_data = AuthenticatorData::from_bytes(attestation.auth_data.clone())?;
    auth_data.verify()?;

    if !auth_data.has_attested_credential_data() {
        return Err(PasskeyError::AuthenticatorData(
            "No attested credential data present".to_string(),
        ));
    }

    let (credential_id_bytes, credential_public_key) =
        parse_attested_credential_data(&attestation.auth_data)?;

    let credential_id = base64url_encode(credential_id_bytes);
    let reported_id = base64url_decode(&reg_data.raw_id)
        .map(|bytes| base64url_encode(bytes))
        .unwrap_or_else(|_| reg_data.raw_id.clone());
    if credential_id != reported_id {
        return Err(PasskeyError::Registration(
            "Credential id does not match attested credential data".to_string(),
        ));
    }

    let public_key = extract_credential_public_key(credential_public_key)?;

    Ok(VerifiedRegistration {
        credential_id,
        public_key,
        counter: auth_data.counter,
        credential_device_type: auth_data.device_type().to_string(),
        credential_backed_up: auth_data.is_backed_up(),
    })
}

fn parse_attestation_object(attestation_base64: &str) -> Result<AttestationObject, PasskeyError> {
    let attestation_bytes = base64url_decode(attestation_base64)
        .map_err(|e| PasskeyError::Format(format!("Failed to decode attestation object: {e}")))?;

    let attestation_cbor: CborValue = ciborium::de::from_reader(&attestation_bytes[..])
        .map_err(|e| PasskeyError::Format(format!("Invalid CBOR data: {e}")))?;

    let CborValue::Map(map) = attestation_cbor else {
        return Err(PasskeyError::Format(
            "Invalid attestation format".to_string(),
        ));
    };

    let mut fmt = None;
    let mut auth_data = None;
    let mut att_stmt = None;

    for (key, value) in map {
        if let CborValue::Text(k) = key {
            match (k.as_str(), value) {
                ("fmt", CborValue::Text(f)) => fmt = Some(f),
                ("authData", CborValue::Bytes(data)) => auth_data = Some(data),
                ("attStmt", CborValue::Map(stmt)) => att_stmt = Some(stmt),
                _ => {}
            }
        }
    }

    match (fmt, auth_data, att_stmt) {
        (Some(fmt), Some(auth_data), Some(att_stmt)) => Ok(AttestationObject {
            fmt,
            auth_data,
            att_stmt,
        }),
        _ => Err(PasskeyError::Format(
            "Missing required attestation data".to_string(),
        )),
    }
}

/// Split attested credential data into the credential id and the COSE key
/// region that follows it.
///
/// Layout after the 37-byte authenticator data header:
/// AAGUID (16) + credential id length (2, big-endian) + credential id +
/// credential public key (COSE).
fn parse_attested_credential_data(auth_data: &[u8]) -> Result<(&[u8], &[u8]), PasskeyError> {
    let mut pos = 37;

    if auth_data.len() < pos + 18 {
        return Err(PasskeyError::Format(
            "Authenticator data too short".to_string(),
        ));
    }

    pos += 16; // AAGUID

    let cred_id_len = ((auth_data[pos] as usize) << 8) | (auth_data[pos + 1] as usize);
    pos += 2;

    if cred_id_len == 0 || cred_id_len > 1024 {
        return Err(PasskeyError::Format(
            "Invalid credential ID length".to_string(),
        ));
    }

    if auth_data.len() < pos + cred_id_len {
        return Err(PasskeyError::Format(
            "Authenticator data too short for credential ID".to_string(),
        ));
    }

    let credential_id = &auth_data[pos..pos + cred_id_len];
    pos += cred_id_len;

    if auth_data.len() <= pos {
        return Err(PasskeyError::Format(
            "Authenticator data too short for public key".to_string(),
        ));
    }

    Ok((credential_id, &auth_data[pos..]))
}

/// Decode the COSE key and re-encode it as an uncompressed SEC1 point.
fn extract_credential_public_key(credential_data: &[u8]) -> Result<String, PasskeyError> {
    let public_key_cbor: CborValue = ciborium::de::from_reader(credential_data)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key CBOR: {e}")))?;

    let (x_coord, y_coord) = extract_public_key_coords(&public_key_cbor)?;

    let mut public_key = Vec::with_capacity(65);
    public_key.push(0x04); // Uncompressed point format
    public_key.extend_from_slice(&x_coord);
    public_key.extend_from_slice(&y_coord);

    Ok(base64url_encode(public_key))
}

fn derive_device_name(reg_data: &RegisterCredential) -> String {
    if let Some(name) = reg_data
        .device_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }

    let transports = reg_data.response.transports.as_deref().unwrap_or(&[]);
    if transports.iter().any(|t| t == "internal") {
        "Platform authenticator".to_string()
    } else if transports
        .iter()
        .any(|t| t == "usb" || t == "nfc" || t == "ble")
    {
        "Security key".to_string()
    } else {
        "Passkey".to_string()
    }
}
