use std::time::SystemTime;

use crate::passkey::config::PASSKEY_CHALLENGE_TIMEOUT;
use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{ChallengeKind, StoredChallenge};
use crate::storage::{CacheStore, GENERIC_CACHE_STORE};
use crate::utils::gen_random_string;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generate a random challenge and persist it under a fresh ceremony id.
///
/// Both ceremony kinds use a uniformly generated ceremony id as the key,
/// so concurrent ceremonies for the same user never race on one entry.
/// Returns `(ceremony_id, challenge)`.
pub(super) async fn create_challenge(
    kind: ChallengeKind,
    user_id: Option<String>,
) -> Result<(String, String), PasskeyError> {
    let challenge = gen_random_string(32)?;
    let ceremony_id = gen_random_string(16)?;

    let stored = StoredChallenge {
        challenge: challenge.clone(),
        kind,
        user_id,
        created_at: now_secs(),
        ttl: *PASSKEY_CHALLENGE_TIMEOUT as u64,
    };

    let inserted = GENERIC_CACHE_STORE
        .lock()
        .await
        .put_if_not_exists(
            kind.cache_prefix(),
            &ceremony_id,
            stored.into(),
            *PASSKEY_CHALLENGE_TIMEOUT as usize,
        )
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    // A 128-bit ceremony id never collides in practice; treat it as a
    // store-level fault rather than retrying.
    if !inserted {
        return Err(PasskeyError::Storage("Ceremony id collision".to_string()));
    }

    tracing::debug!("Stored {:?} challenge under ceremony id {}", kind, ceremony_id);

    Ok((ceremony_id, challenge))
}

/// Load a stored challenge and enforce its TTL.
///
/// An expired challenge is deleted before the call fails, so it can never
/// be replayed once its window has passed.
pub(super) async fn get_and_validate_challenge(
    kind: ChallengeKind,
    ceremony_id: &str,
) -> Result<StoredChallenge, PasskeyError> {
    let cached = GENERIC_CACHE_STORE
        .lock()
        .await
        .get(kind.cache_prefix(), ceremony_id)
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?
        .ok_or(PasskeyError::NotFound("Challenge not found".to_string()))?;

    let stored: StoredChallenge = cached.try_into()?;

    let age = now_secs().saturating_sub(stored.created_at);
    let timeout = stored.ttl.min(*PASSKEY_CHALLENGE_TIMEOUT as u64);
    if age > timeout {
        tracing::warn!(
            "Challenge expired after {} seconds (timeout: {})",
            age,
            timeout
        );
        remove_challenge(kind, ceremony_id).await?;
        return Err(PasskeyError::Expired("Challenge has expired".to_string()));
    }

    Ok(stored)
}

/// Remove a challenge once its ceremony has concluded.
pub(super) async fn remove_challenge(
    kind: ChallengeKind,
    ceremony_id: &str,
) -> Result<(), PasskeyError> {
    GENERIC_CACHE_STORE
        .lock()
        .await
        .remove(kind.cache_prefix(), ceremony_id)
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?;
    tracing::debug!("Removed {:?} challenge {}", kind, ceremony_id);

    Ok(())
}
