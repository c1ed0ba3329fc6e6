use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::PasskeyError;
use crate::storage::CacheData;

/// The two ceremony kinds. A challenge issued for one kind is never
/// accepted by the other: each kind maps to its own cache collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Registration,
    Authentication,
}

impl ChallengeKind {
    pub(super) fn cache_prefix(&self) -> &'static str {
        match self {
            ChallengeKind::Registration => "registration_challenge",
            ChallengeKind::Authentication => "authentication_challenge",
        }
    }
}

/// A short-lived challenge persisted for the duration of one ceremony,
/// keyed by a uniformly generated ceremony id.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub(super) struct StoredChallenge {
    pub(super) challenge: String,
    pub(super) kind: ChallengeKind,
    /// Owning user for registration ceremonies; None for authentication,
    /// where the user is only known after credential lookup.
    pub(super) user_id: Option<String>,
    /// Unix seconds at issuance
    pub(super) created_at: u64,
    pub(super) ttl: u64,
}

impl From<StoredChallenge> for CacheData {
    fn from(data: StoredChallenge) -> Self {
        Self {
            value: serde_json::to_string(&data).expect("Failed to serialize StoredChallenge"),
        }
    }
}

impl TryFrom<CacheData> for StoredChallenge {
    type Error = PasskeyError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&data.value).map_err(|e| PasskeyError::Storage(e.to_string()))
    }
}

/// Stored credential record for a WebAuthn/Passkey.
///
/// Holds everything needed to verify later assertions against this
/// credential: the public key, the credential id, and the signature
/// counter, plus device metadata surfaced in credential listings.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PasskeyCredential {
    /// Surrogate record id; the only identifier exposed to clients
    pub id: String,
    /// base64url credential id as reported by the authenticator
    pub credential_id: String,
    /// Owning user; immutable after creation
    pub user_id: String,
    /// base64url SEC1 uncompressed P-256 public key
    pub public_key: String,
    /// Signature counter; monotonic, never decreasing
    pub counter: u32,
    /// "singleDevice" or "multiDevice" (backup-eligibility flag)
    pub credential_device_type: String,
    /// Whether the credential is currently backed up (backup-state flag)
    pub credential_backed_up: bool,
    /// Human-readable label for credential management UIs
    pub device_name: String,
    /// Transports reported by the client (e.g. "internal", "usb")
    pub transports: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// Listing view of a credential with key material and the raw credential
/// id stripped. This is the only shape the credential-management API
/// returns.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyInfo {
    pub id: String,
    pub device_name: String,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl From<PasskeyCredential> for PasskeyInfo {
    fn from(credential: PasskeyCredential) -> Self {
        Self {
            id: credential.id,
            device_name: credential.device_name,
            credential_device_type: credential.credential_device_type,
            credential_backed_up: credential.credential_backed_up,
            created_at: credential.created_at,
            last_used_at: credential.last_used_at,
        }
    }
}

/// Search field options for credential lookup.
#[derive(Debug)]
pub enum CredentialSearchField {
    /// Search by the surrogate record id
    Id(String),
    /// Search by the authenticator-reported credential id
    CredentialId(String),
    /// Search by owning user id
    UserId(String),
}
