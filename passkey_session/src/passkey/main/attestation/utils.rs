use ciborium::value::{Integer, Value as CborValue};

use crate::passkey::errors::PasskeyError;

const COSE_KTY_EC2: i64 = 2;
const COSE_ALG_ES256: i64 = -7;

pub(super) fn cbor_int(i: &Integer) -> i64 {
    i128::from(*i) as i64
}

/// Pull `alg` and `sig` out of an attestation statement map.
pub(super) fn get_alg_and_sig(
    att_stmt: &[(CborValue, CborValue)],
) -> Result<(i64, Vec<u8>), PasskeyError> {
    let mut alg: Option<i64> = None;
    let mut sig: Option<Vec<u8>> = None;

    for (key, value) in att_stmt {
        match key {
            CborValue::Text(k) if k == "alg" => {
                if let CborValue::Integer(a) = value {
                    alg = Some(cbor_int(a));
                }
            }
            CborValue::Text(k) if k == "sig" => {
                if let CborValue::Bytes(s) = value {
                    sig = Some(s.clone());
                }
            }
            _ => {}
        }
    }

    match (alg, sig) {
        (Some(a), Some(s)) => Ok((a, s)),
        _ => Err(PasskeyError::Verification(
            "Missing algorithm or signature in attestation statement".to_string(),
        )),
    }
}

/// Extract the x/y coordinates from a COSE EC2 public key, rejecting keys
/// that declare a key type or algorithm other than EC2/ES256.
pub(in crate::passkey::main) fn extract_public_key_coords(
    public_key_cbor: &CborValue,
) -> Result<(Vec<u8>, Vec<u8>), PasskeyError> {
    let CborValue::Map(map) = public_key_cbor else {
        return Err(PasskeyError::Format("Invalid public key format".to_string()));
    };

    let mut x_coord = None;
    let mut y_coord = None;

    for (key, value) in map {
        let CborValue::Integer(label) = key else {
            continue;
        };
        match (cbor_int(label), value) {
            // kty (1) must be EC2 when present
            (1, CborValue::Integer(kty)) if cbor_int(kty) != COSE_KTY_EC2 => {
                return Err(PasskeyError::Format(format!(
                    "Unsupported COSE key type: {}",
                    cbor_int(kty)
                )));
            }
            // alg (3) must be ES256 when present
            (3, CborValue::Integer(alg)) if cbor_int(alg) != COSE_ALG_ES256 => {
                return Err(PasskeyError::Format(format!(
                    "Unsupported COSE algorithm: {}",
                    cbor_int(alg)
                )));
            }
            (-2, CborValue::Bytes(x)) => x_coord = Some(x.clone()),
            (-3, CborValue::Bytes(y)) => y_coord = Some(y.clone()),
            _ => {}
        }
    }

    match (x_coord, y_coord) {
        (Some(x), Some(y)) if x.len() == 32 && y.len() == 32 => Ok((x, y)),
        (Some(_), Some(_)) => Err(PasskeyError::Format(
            "Public key coordinates have unexpected length".to_string(),
        )),
        _ => Err(PasskeyError::Format(
            "Missing or invalid key coordinates".to_string(),
        )),
    }
}
