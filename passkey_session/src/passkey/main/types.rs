use ciborium::value::Value as CborValue;
use ring::digest;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::passkey::config::{ORIGIN, PASSKEY_RP_ID, PASSKEY_USER_VERIFICATION};
use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;

/// User entity presented to the browser in creation options.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    /// Opaque user handle (the WebAuthn user.id)
    pub user_handle: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Serialize, Debug)]
pub(super) struct RelyingParty {
    pub(super) name: String,
    pub(super) id: String,
}

#[derive(Serialize, Debug)]
pub(super) struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) alg: i32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthenticatorSelection {
    pub(super) authenticator_attachment: String,
    pub(super) resident_key: String,
    pub(super) require_resident_key: bool,
    pub(super) user_verification: String,
}

/// A credential descriptor listed in exclude/allow lists.
#[derive(Serialize, Debug)]
pub(super) struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) id: String,
}

/// Options for initiating a WebAuthn registration ceremony, in the shape
/// `navigator.credentials.create()` expects, plus the ceremony id the
/// client must echo back when it submits the attestation response.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub(super) challenge: String,
    pub(super) rp_id: String,
    pub(super) rp: RelyingParty,
    pub(super) user: PublicKeyCredentialUserEntity,
    pub(super) pub_key_cred_params: Vec<PubKeyCredParam>,
    pub(super) authenticator_selection: AuthenticatorSelection,
    pub(super) exclude_credentials: Vec<CredentialDescriptor>,
    pub(super) timeout: u32,
    pub(super) attestation: String,
    pub(super) ceremony_id: String,
}

impl RegistrationOptions {
    /// The ceremony id under which the challenge was stored.
    pub fn ceremony_id(&self) -> &str {
        &self.ceremony_id
    }
}

/// Options for initiating a WebAuthn authentication ceremony. An empty
/// allow-list means any discoverable credential is acceptable.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub(super) challenge: String,
    pub(super) timeout: u32,
    pub(super) rp_id: String,
    pub(super) allow_credentials: Vec<CredentialDescriptor>,
    pub(super) user_verification: String,
    pub(super) ceremony_id: String,
}

impl AuthenticationOptions {
    pub fn ceremony_id(&self) -> &str {
        &self.ceremony_id
    }
}

/// Attestation response submitted by the browser at the end of a
/// registration ceremony. Fixed-field model: payloads of any other shape
/// are rejected at deserialization, before any cryptographic step runs.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredential {
    pub(super) id: String,
    pub(super) raw_id: String,
    #[serde(rename = "type")]
    pub(super) type_: String,
    pub(super) ceremony_id: String,
    /// Optional client-supplied label for the new credential
    pub(super) device_name: Option<String>,
    pub(super) response: AuthenticatorAttestationResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthenticatorAttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub(super) client_data_json: String,
    pub(super) attestation_object: String,
    pub(super) transports: Option<Vec<String>>,
}

/// Assertion response submitted by the browser at the end of an
/// authentication ceremony.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    pub(super) id: String,
    #[allow(unused)]
    pub(super) raw_id: String,
    pub(super) ceremony_id: String,
    #[allow(unused)]
    pub(super) authenticator_attachment: Option<String>,
    pub(super) response: AuthenticatorAssertionResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthenticatorAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub(super) client_data_json: String,
    pub(super) authenticator_data: String,
    pub(super) signature: String,
    pub(super) user_handle: Option<String>,
}

/// clientDataJSON decoded into its three required fields, with the raw
/// bytes retained for hashing into the signature base.
#[derive(Debug)]
pub(super) struct ParsedClientData {
    pub(super) challenge: String,
    pub(super) origin: String,
    pub(super) type_: String,
    pub(super) raw_data: Vec<u8>,
}

impl ParsedClientData {
    pub(super) fn from_base64(client_data_json: &str) -> Result<Self, PasskeyError> {
        let raw_data = base64url_decode(client_data_json)
            .map_err(|e| PasskeyError::Format(format!("Failed to decode client data: {e}")))?;

        let data_str = String::from_utf8(raw_data.clone())
            .map_err(|e| PasskeyError::Format(format!("Client data is not valid UTF-8: {e}")))?;

        let data: serde_json::Value = serde_json::from_str(&data_str)
            .map_err(|e| PasskeyError::Format(format!("Invalid client data JSON: {e}")))?;

        let challenge = data["challenge"]
            .as_str()
            .ok_or_else(|| PasskeyError::ClientData("Missing challenge".into()))?
            .to_string();

        Ok(Self {
            challenge,
            origin: data["origin"]
                .as_str()
                .ok_or_else(|| PasskeyError::ClientData("Missing origin".into()))?
                .to_string(),
            type_: data["type"]
                .as_str()
                .ok_or_else(|| PasskeyError::ClientData("Missing type".into()))?
                .to_string(),
            raw_data,
        })
    }

    /// Verify type, challenge and origin against the stored ceremony state.
    /// The challenge comparison is constant-time.
    pub(super) fn verify(
        &self,
        expected_type: &str,
        stored_challenge: &str,
    ) -> Result<(), PasskeyError> {
        if self.type_ != expected_type {
            return Err(PasskeyError::ClientData(format!(
                "Invalid type. Expected '{}', got '{}'",
                expected_type, self.type_
            )));
        }

        let challenge_matches: bool = self
            .challenge
            .as_bytes()
            .ct_eq(stored_challenge.as_bytes())
            .into();
        if !challenge_matches {
            return Err(PasskeyError::Challenge(
                "Challenge verification failed".into(),
            ));
        }

        if self.origin != *ORIGIN {
            return Err(PasskeyError::ClientData(format!(
                "Invalid origin. Expected: {}, Got: {}",
                *ORIGIN, self.origin
            )));
        }

        Ok(())
    }
}

/// Flags for AuthenticatorData as defined in WebAuthn Level 2
mod auth_data_flags {
    /// User Present (UP) - Bit 0
    pub(super) const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub(super) const UV: u8 = 1 << 2;
    /// Backup Eligibility (BE) - Bit 3
    pub(super) const BE: u8 = 1 << 3;
    /// Backup State (BS) - Bit 4
    pub(super) const BS: u8 = 1 << 4;
    /// Attested Credential Data Present (AT) - Bit 6
    pub(super) const AT: u8 = 1 << 6;
}

/// Authenticator data as defined in WebAuthn Level 2.
/// Minimum 37 bytes: RP ID hash (32) + flags (1) + counter (4), followed
/// by optional attested credential data and extensions.
#[derive(Debug)]
pub(super) struct AuthenticatorData {
    pub(super) rp_id_hash: Vec<u8>,
    pub(super) flags: u8,
    pub(super) counter: u32,
    pub(super) raw_data: Vec<u8>,
}

impl AuthenticatorData {
    pub(super) fn from_base64(auth_data: &str) -> Result<Self, PasskeyError> {
        let data = base64url_decode(auth_data).map_err(|e| {
            PasskeyError::Format(format!("Failed to decode authenticator data: {e}"))
        })?;
        Self::from_bytes(data)
    }

    pub(super) fn from_bytes(data: Vec<u8>) -> Result<Self, PasskeyError> {
        if data.len() < 37 {
            return Err(PasskeyError::AuthenticatorData(
                "Authenticator data too short".into(),
            ));
        }

        Ok(Self {
            rp_id_hash: data[..32].to_vec(),
            flags: data[32],
            counter: u32::from_be_bytes([data[33], data[34], data[35], data[36]]),
            raw_data: data,
        })
    }

    pub(super) fn is_user_present(&self) -> bool {
        (self.flags & auth_data_flags::UP) != 0
    }

    pub(super) fn is_user_verified(&self) -> bool {
        (self.flags & auth_data_flags::UV) != 0
    }

    /// Backup-eligible credentials are synced ("multiDevice") passkeys
    pub(super) fn is_backup_eligible(&self) -> bool {
        (self.flags & auth_data_flags::BE) != 0
    }

    pub(super) fn is_backed_up(&self) -> bool {
        (self.flags & auth_data_flags::BS) != 0
    }

    pub(super) fn has_attested_credential_data(&self) -> bool {
        (self.flags & auth_data_flags::AT) != 0
    }

    pub(super) fn device_type(&self) -> &'static str {
        if self.is_backup_eligible() {
            "multiDevice"
        } else {
            "singleDevice"
        }
    }

    /// Verify rp id hash and flag requirements.
    pub(super) fn verify(&self) -> Result<(), PasskeyError> {
        let expected_hash = digest::digest(&digest::SHA256, PASSKEY_RP_ID.as_bytes());
        if self.rp_id_hash != expected_hash.as_ref() {
            return Err(PasskeyError::AuthenticatorData(
                "RP ID hash mismatch".into(),
            ));
        }

        if !self.is_user_present() {
            return Err(PasskeyError::Authentication("User not present".into()));
        }

        if *PASSKEY_USER_VERIFICATION == "required" && !self.is_user_verified() {
            return Err(PasskeyError::AuthenticatorData(format!(
                "User verification required but flag not set. Flags: {:02x}",
                self.flags
            )));
        }

        tracing::debug!(
            "Authenticator data verified: UP={}, UV={}, BE={}, BS={}",
            self.is_user_present(),
            self.is_user_verified(),
            self.is_backup_eligible(),
            self.is_backed_up(),
        );

        Ok(())
    }
}

/// Decoded attestation object from a registration response.
#[derive(Debug)]
pub(super) struct AttestationObject {
    pub(super) fmt: String,
    pub(super) auth_data: Vec<u8>,
    pub(super) att_stmt: Vec<(CborValue, CborValue)>,
}
