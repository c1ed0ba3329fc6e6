use ciborium::value::Value as CborValue;
use ring::signature::UnparsedPublicKey;
use std::time::SystemTime;
use uuid::Uuid;
use webpki::EndEntityCert;
use x509_parser::{certificate::X509Certificate, prelude::*, time::ASN1Time};

use crate::passkey::errors::PasskeyError;

use super::utils::{extract_public_key_coords, get_alg_and_sig};

// id-fido-gen-ce-aaguid
const OID_FIDO_GEN_CE_AAGUID: &str = "1.3.6.1.4.1.45724.1.1.4";
const ES256_ALG: i64 = -7;

/// Verify a packed attestation statement: either full attestation with an
/// x5c certificate chain, or self attestation signed by the credential key
/// itself. ECDAA is not supported.
pub(super) fn verify_packed_attestation(
    auth_data: &[u8],
    client_data_hash: &[u8],
    att_stmt: &[(CborValue, CborValue)],
) -> Result<(), PasskeyError> {
    let (alg, sig) = get_alg_and_sig(att_stmt)?;

    if alg != ES256_ALG {
        return Err(PasskeyError::Verification(format!(
            "Unsupported attestation algorithm: {alg}"
        )));
    }

    // Signature base: authData || SHA-256(clientDataJSON)
    let mut signed_data = Vec::with_capacity(auth_data.len() + client_data_hash.len());
    signed_data.extend_from_slice(auth_data);
    signed_data.extend_from_slice(client_data_hash);

    let mut x5c: Option<Vec<Vec<u8>>> = None;
    let mut ecdaa_key_id: Option<Vec<u8>> = None;

    for (key, value) in att_stmt {
        match (key, value) {
            (CborValue::Text(k), CborValue::Array(certs)) if k == "x5c" => {
                let chain: Vec<Vec<u8>> = certs
                    .iter()
                    .filter_map(|cert| match cert {
                        CborValue::Bytes(bytes) => Some(bytes.clone()),
                        _ => None,
                    })
                    .collect();
                if !chain.is_empty() {
                    x5c = Some(chain);
                }
            }
            (CborValue::Text(k), CborValue::Bytes(id)) if k == "ecdaaKeyId" => {
                ecdaa_key_id = Some(id.clone());
            }
            _ => {}
        }
    }

    match (x5c, ecdaa_key_id) {
        (Some(chain), None) => {
            tracing::debug!("Packed attestation with certificate chain");
            verify_full_attestation(&chain, auth_data, &signed_data, &sig)
        }
        (None, Some(_)) => Err(PasskeyError::Verification(
            "ECDAA attestation not supported".to_string(),
        )),
        (None, None) => {
            tracing::debug!("Packed self attestation");
            verify_self_attestation(auth_data, &signed_data, &sig)
        }
        (Some(_), Some(_)) => Err(PasskeyError::Verification(
            "Invalid attestation: both x5c and ecdaaKeyId present".to_string(),
        )),
    }
}

fn verify_full_attestation(
    x5c: &[Vec<u8>],
    auth_data: &[u8],
    signed_data: &[u8],
    sig: &[u8],
) -> Result<(), PasskeyError> {
    let attestn_cert_bytes = &x5c[0];
    let attestn_cert = EndEntityCert::try_from(attestn_cert_bytes.as_ref()).map_err(|e| {
        PasskeyError::Verification(format!("Failed to parse attestation certificate: {e:?}"))
    })?;

    let (_, x509_cert) = X509Certificate::from_der(attestn_cert_bytes).map_err(|e| {
        PasskeyError::Verification(format!("Failed to parse X509 certificate: {e}"))
    })?;

    verify_attestation_cert_attributes(&x509_cert, auth_data)?;

    attestn_cert
        .verify_signature(&webpki::ECDSA_P256_SHA256, signed_data, sig)
        .map_err(|_| PasskeyError::Verification("Attestation signature invalid".to_string()))?;

    if x5c.len() > 1 {
        verify_chain_validity(&x5c[1..])?;
    }

    Ok(())
}

/// FIDO-mandated attributes on the attestation certificate: it must not be
/// a CA, and its id-fido-gen-ce-aaguid extension (when present) must match
/// the AAGUID in the authenticator data.
fn verify_attestation_cert_attributes(
    cert: &X509Certificate,
    auth_data: &[u8],
) -> Result<(), PasskeyError> {
    if let Some(basic_constraints) = cert
        .extensions()
        .iter()
        .find(|ext| ext.oid.as_bytes() == oid_registry::OID_X509_EXT_BASIC_CONSTRAINTS.as_bytes())
    {
        if basic_constraints.value.contains(&0x01) {
            return Err(PasskeyError::Verification(
                "Attestation certificate must not be a CA certificate".to_string(),
            ));
        }
    }

    if let Some(fido_ext) = cert
        .extensions()
        .iter()
        .find(|ext| ext.oid.to_string() == OID_FIDO_GEN_CE_AAGUID)
    {
        if auth_data.len() < 53 {
            return Err(PasskeyError::Verification(
                "Authenticator data too short for AAGUID".to_string(),
            ));
        }
        let auth_data_aaguid = &auth_data[37..53];
        // Extension value is an OCTET STRING: 0x04, length 0x10, 16 bytes
        let cert_aaguid = fido_ext.value;
        if cert_aaguid.len() < 18 || auth_data_aaguid != &cert_aaguid[2..18] {
            let authenticator_uuid = Uuid::from_slice(auth_data_aaguid)
                .map(|u| u.hyphenated().to_string())
                .unwrap_or_default();
            tracing::warn!("AAGUID mismatch for authenticator {}", authenticator_uuid);
            return Err(PasskeyError::Verification(
                "AAGUID mismatch between certificate and authenticator data".to_string(),
            ));
        }
    }

    Ok(())
}

fn verify_chain_validity(intermediates: &[Vec<u8>]) -> Result<(), PasskeyError> {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| PasskeyError::Verification(format!("System time error: {e}")))?;

    let timestamp = ASN1Time::from_timestamp(now.as_secs() as i64)
        .map_err(|e| PasskeyError::Verification(format!("Failed to convert time: {e}")))?;

    for cert_bytes in intermediates {
        let (_, cert) = X509Certificate::from_der(cert_bytes).map_err(|e| {
            PasskeyError::Verification(format!("Failed to parse certificate in chain: {e}"))
        })?;

        if !cert.validity().is_valid_at(timestamp) {
            return Err(PasskeyError::Verification(
                "Certificate in chain is expired or not yet valid".to_string(),
            ));
        }
    }

    Ok(())
}

/// Self attestation: the signature is made with the credential private key,
/// so verify it against the public key embedded in the attested credential
/// data.
fn verify_self_attestation(
    auth_data: &[u8],
    signed_data: &[u8],
    signature: &[u8],
) -> Result<(), PasskeyError> {
    if auth_data.len() < 55 {
        return Err(PasskeyError::Verification(
            "Authenticator data too short for self attestation".to_string(),
        ));
    }

    let flags = auth_data[32];
    if (flags & 0x40) == 0 {
        return Err(PasskeyError::Verification(
            "No attested credential data in self attestation".to_string(),
        ));
    }

    // RP ID hash (32) + flags (1) + counter (4) + AAGUID (16)
    let mut pos = 53;
    let cred_id_len = ((auth_data[pos] as usize) << 8) | (auth_data[pos + 1] as usize);
    pos += 2 + cred_id_len;

    if auth_data.len() <= pos {
        return Err(PasskeyError::Verification(
            "Authenticator data too short for credential public key".to_string(),
        ));
    }

    let public_key_cbor: CborValue = ciborium::de::from_reader(&auth_data[pos..]).map_err(|e| {
        PasskeyError::Verification(format!("Invalid public key CBOR in self attestation: {e}"))
    })?;

    let (x_coord, y_coord) = extract_public_key_coords(&public_key_cbor)?;

    let mut public_key = Vec::with_capacity(65);
    public_key.push(0x04); // Uncompressed point format
    public_key.extend_from_slice(&x_coord);
    public_key.extend_from_slice(&y_coord);

    let public_key = UnparsedPublicKey::new(&ring::signature::ECDSA_P256_SHA256_ASN1, &public_key);

    public_key.verify(signed_data, signature).map_err(|_| {
        PasskeyError::Verification("Self attestation signature verification failed".to_string())
    })
}
