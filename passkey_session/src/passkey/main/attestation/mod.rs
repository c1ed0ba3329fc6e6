mod none;
mod packed;
mod utils;

use ring::digest;

use crate::passkey::errors::PasskeyError;

use super::types::AttestationObject;
use none::verify_none_attestation;
use packed::verify_packed_attestation;

pub(super) use utils::extract_public_key_coords;

/// Dispatch attestation verification on the statement format.
///
/// "none" carries no signature; "packed" is verified in full. Any other
/// format fails closed rather than being accepted unverified.
pub(super) fn verify_attestation(
    attestation: &AttestationObject,
    client_data: &[u8],
) -> Result<(), PasskeyError> {
    let client_data_hash = digest::digest(&digest::SHA256, client_data);

    match attestation.fmt.as_str() {
        "none" => {
            tracing::debug!("Using 'none' attestation format");
            verify_none_attestation(attestation)
        }
        "packed" => {
            tracing::debug!("Using 'packed' attestation format");
            verify_packed_attestation(
                &attestation.auth_data,
                client_data_hash.as_ref(),
                &attestation.att_stmt,
            )
        }
        fmt => Err(PasskeyError::Format(format!(
            "Unsupported attestation format: {fmt}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_fails_closed() {
        let attestation = AttestationObject {
            fmt: "android-safetynet".to_string(),
            auth_data: vec![0u8; 37],
            att_stmt: vec![],
        };
        match verify_attestation(&attestation, b"{}") {
            Err(PasskeyError::Format(msg)) => assert!(msg.contains("Unsupported")),
            other => panic!("Expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn test_none_format_dispatch() {
        let attestation = AttestationObject {
            fmt: "none".to_string(),
            auth_data: vec![0u8; 37],
            att_stmt: vec![],
        };
        assert!(verify_attestation(&attestation, b"{}").is_ok());
    }
}
