//! A synthetic authenticator for driving full ceremonies in tests: it
//! holds a real P-256 keypair and produces attestation ("none" format)
//! and assertion payloads exactly as a browser would deliver them.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ciborium::value::Value as CborValue;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};

use super::{test_origin, test_rp_id};

pub fn b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub struct SyntheticAuthenticator {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    pub credential_id: Vec<u8>,
    origin: String,
    rp_id: String,
}

impl SyntheticAuthenticator {
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .expect("Failed to generate keypair");
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
            .expect("Failed to load keypair");

        let mut credential_id = vec![0u8; 16];
        rng.fill(&mut credential_id).unwrap();

        Self {
            key_pair,
            rng,
            credential_id,
            origin: test_origin(),
            rp_id: test_rp_id(),
        }
    }

    pub fn credential_id_b64(&self) -> String {
        b64(&self.credential_id)
    }

    fn rp_id_hash(&self) -> Vec<u8> {
        digest::digest(&digest::SHA256, self.rp_id.as_bytes())
            .as_ref()
            .to_vec()
    }

    /// COSE EC2/ES256 encoding of the credential public key.
    fn cose_public_key(&self) -> Vec<u8> {
        let point = self.key_pair.public_key().as_ref();
        assert_eq!(point.len(), 65, "expected uncompressed SEC1 point");
        let x = point[1..33].to_vec();
        let y = point[33..65].to_vec();

        let map = CborValue::Map(vec![
            (CborValue::Integer(1.into()), CborValue::Integer(2.into())),
            (CborValue::Integer(3.into()), CborValue::Integer((-7).into())),
            (CborValue::Integer((-2).into()), CborValue::Bytes(x)),
            (CborValue::Integer((-3).into()), CborValue::Bytes(y)),
        ]);

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&map, &mut bytes).unwrap();
        bytes
    }

    fn client_data(&self, type_: &str, challenge: &str) -> Vec<u8> {
        serde_json::json!({
            "type": type_,
            "challenge": challenge,
            "origin": self.origin,
        })
        .to_string()
        .into_bytes()
    }

    /// Authenticator data with attested credential data, as produced
    /// during registration. Flags: UP | UV | AT.
    fn registration_auth_data(&self, counter: u32) -> Vec<u8> {
        let mut data = self.rp_id_hash();
        data.push(0x01 | 0x04 | 0x40);
        data.extend_from_slice(&counter.to_be_bytes());
        data.extend_from_slice(&[0u8; 16]); // AAGUID
        data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(&self.credential_id);
        data.extend_from_slice(&self.cose_public_key());
        data
    }

    /// Build a registration response for the given ceremony, with a
    /// "none"-format attestation object.
    pub fn registration_response(&self, ceremony_id: &str, challenge: &str) -> serde_json::Value {
        let client_data = self.client_data("webauthn.create", challenge);

        let attestation = CborValue::Map(vec![
            (
                CborValue::Text("fmt".to_string()),
                CborValue::Text("none".to_string()),
            ),
            (CborValue::Text("attStmt".to_string()), CborValue::Map(vec![])),
            (
                CborValue::Text("authData".to_string()),
                CborValue::Bytes(self.registration_auth_data(0)),
            ),
        ]);
        let mut attestation_bytes = Vec::new();
        ciborium::ser::into_writer(&attestation, &mut attestation_bytes).unwrap();

        serde_json::json!({
            "id": self.credential_id_b64(),
            "rawId": self.credential_id_b64(),
            "type": "public-key",
            "ceremonyId": ceremony_id,
            "deviceName": null,
            "response": {
                "clientDataJSON": b64(&client_data),
                "attestationObject": b64(&attestation_bytes),
                "transports": ["usb"],
            },
        })
    }

    /// Build an assertion response: a genuine signature over
    /// `authData || SHA-256(clientDataJSON)` with the credential key.
    pub fn assertion_response(
        &self,
        ceremony_id: &str,
        challenge: &str,
        counter: u32,
    ) -> serde_json::Value {
        let client_data = self.client_data("webauthn.get", challenge);

        let mut auth_data = self.rp_id_hash();
        auth_data.push(0x01 | 0x04); // UP | UV
        auth_data.extend_from_slice(&counter.to_be_bytes());

        let client_data_hash = digest::digest(&digest::SHA256, &client_data);
        let mut signed_data = auth_data.clone();
        signed_data.extend_from_slice(client_data_hash.as_ref());

        let signature = self
            .key_pair
            .sign(&self.rng, &signed_data)
            .expect("Failed to sign assertion");

        serde_json::json!({
            "id": self.credential_id_b64(),
            "rawId": self.credential_id_b64(),
            "ceremonyId": ceremony_id,
            "response": {
                "clientDataJSON": b64(&client_data),
                "authenticatorData": b64(&auth_data),
                "signature": b64(signature.as_ref()),
                "userHandle": null,
            },
        })
    }
}
