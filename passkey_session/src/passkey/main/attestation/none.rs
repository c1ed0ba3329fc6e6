use crate::passkey::errors::PasskeyError;

use super::super::types::AttestationObject;

/// "none" attestation carries no signature to verify; the only protocol
/// requirement is an empty attestation statement. All structural checks on
/// the authenticator data (rp id hash, flags, attested credential data)
/// happen in the shared registration path.
pub(super) fn verify_none_attestation(attestation: &AttestationObject) -> Result<(), PasskeyError> {
    if !attestation.att_stmt.is_empty() {
        return Err(PasskeyError::Format(
            "attStmt must be empty for none attestation".to_string(),
        ));
    }

    Ok(())
}
