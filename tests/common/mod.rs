//! Shared test authenticator: builds the client data, authenticator data,
//! COSE keys, attestation objects and the minimal self-signed P-256
//! certificate the ceremony flows consume.
#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ciborium::value::Value as CborValue;
use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};

use webauthn_u2f::{AuthenticatorAssertionResponse, AuthenticatorAttestationResponse, RegisterCredential};

pub const RP_ORIGIN: &str = "https://example.com";
pub const RP_ID: &str = "example.com";

pub fn b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn b64_decode(data: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD.decode(data).expect("valid base64url")
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

pub fn rp_id_hash() -> Vec<u8> {
    sha256(RP_ID.as_bytes())
}

pub fn client_data_json(type_: &str, challenge: &str, origin: &str) -> Vec<u8> {
    serde_json::json!({
        "type": type_,
        "challenge": challenge,
        "origin": origin
    })
    .to_string()
    .into_bytes()
}

/// A software authenticator holding one P-256 key pair, used both as the
/// credential key and as the attestation certificate key.
pub struct TestAuthenticator {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    pub credential_id: Vec<u8>,
    pub aaguid: [u8; 16],
}

impl TestAuthenticator {
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        let mut credential_id = vec![0u8; 32];
        ring::rand::SecureRandom::fill(&rng, &mut credential_id).unwrap();
        Self {
            key_pair,
            rng,
            credential_id,
            aaguid: [0x0F; 16],
        }
    }

    pub fn credential_id_b64(&self) -> String {
        b64(&self.credential_id)
    }

    /// 65-byte uncompressed point, 0x04 prefix.
    pub fn public_key_point(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }

    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.key_pair
            .sign(&self.rng, payload)
            .unwrap()
            .as_ref()
            .to_vec()
    }

    /// COSE_Key CBOR map for the credential public key.
    pub fn cose_public_key(&self) -> Vec<u8> {
        let point = self.public_key_point();
        encode_cose_key(&point[1..33], &point[33..65])
    }

    /// Authenticator data with the attested credential tail (AT flag).
    pub fn make_credential_auth_data(&self, flags: u8, sign_count: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&rp_id_hash());
        data.push(flags);
        data.extend_from_slice(&sign_count.to_be_bytes());
        data.extend_from_slice(&self.aaguid);
        data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(&self.credential_id);
        data.extend_from_slice(&self.cose_public_key());
        data
    }

    /// The U2F registration signature over
    /// `0x00 || rpIdHash || clientDataHash || credentialId || rawPoint`.
    pub fn u2f_registration_signature(&self, client_data: &[u8]) -> Vec<u8> {
        let mut verification_data = vec![0x00];
        verification_data.extend_from_slice(&rp_id_hash());
        verification_data.extend_from_slice(&sha256(client_data));
        verification_data.extend_from_slice(&self.credential_id);
        verification_data.extend_from_slice(&self.public_key_point());
        self.sign(&verification_data)
    }

    /// A fully wired registration payload with explicit knobs.
    pub fn register_credential_with(
        &self,
        origin: &str,
        challenge: &str,
        flags: u8,
        fmt: &str,
        mutate_sig: impl FnOnce(&mut Vec<u8>),
    ) -> RegisterCredential {
        let client_data = client_data_json("webauthn.create", challenge, origin);
        let auth_data = self.make_credential_auth_data(flags, 0);
        let mut sig = self.u2f_registration_signature(&client_data);
        mutate_sig(&mut sig);
        let attestation_object =
            encode_attestation_object(fmt, &auth_data, &sig, &self.self_signed_certificate());
        RegisterCredential {
            response: AuthenticatorAttestationResponse {
                attestation_object: b64(&attestation_object),
                client_data_json: b64(&client_data),
            },
        }
    }

    /// Happy-path registration payload: flags UP|AT, fmt fido-u2f.
    pub fn register_credential(&self, challenge: &str) -> RegisterCredential {
        self.register_credential_with(RP_ORIGIN, challenge, 0x41, "fido-u2f", |_| {})
    }

    /// A fully wired assertion payload signed over
    /// `authenticatorData || SHA-256(clientData)`.
    pub fn assertion(&self, challenge: &str, sign_count: u32) -> AuthenticatorAssertionResponse {
        let client_data = client_data_json("webauthn.get", challenge, RP_ORIGIN);
        let auth_data = assertion_auth_data(0x01, sign_count);
        let mut payload = auth_data.clone();
        payload.extend_from_slice(&sha256(&client_data));
        let signature = self.sign(&payload);
        AuthenticatorAssertionResponse {
            credential_id: self.credential_id_b64(),
            client_data_json: b64(&client_data),
            authenticator_data: b64(&auth_data),
            signature: b64(&signature),
            user_handle: None,
        }
    }

    /// Minimal self-signed X.509 v3 certificate over the authenticator key.
    pub fn self_signed_certificate(&self) -> Vec<u8> {
        let name = tlv(
            0x30,
            &tlv(
                0x31,
                &tlv(
                    0x30,
                    &[oid(OID_COMMON_NAME), tlv(0x0C, b"U2F Test")].concat(),
                ),
            ),
        );
        let sig_alg = tlv(0x30, &oid(OID_ECDSA_WITH_SHA256));
        let validity = tlv(
            0x30,
            &[tlv(0x17, b"200101000000Z"), tlv(0x17, b"491231235959Z")].concat(),
        );
        let spki_alg = tlv(0x30, &[oid(OID_EC_PUBLIC_KEY), oid(OID_PRIME256V1)].concat());
        let mut key_bits = vec![0x00];
        key_bits.extend_from_slice(&self.public_key_point());
        let spki = tlv(0x30, &[spki_alg, tlv(0x03, &key_bits)].concat());

        let version = tlv(0xA0, &tlv(0x02, &[0x02]));
        let serial = tlv(0x02, &[0x01]);
        // v3 certificates carry an explicit [3] extensions field; webpki
        // requires it to be present. A non-CA basicConstraints is enough.
        let basic_constraints = tlv(
            0x30,
            &[oid(OID_BASIC_CONSTRAINTS), tlv(0x04, &tlv(0x30, &[]))].concat(),
        );
        let extensions = tlv(0xA3, &tlv(0x30, &basic_constraints));
        let tbs = tlv(
            0x30,
            &[
                version,
                serial,
                sig_alg.clone(),
                name.clone(),
                validity,
                name,
                spki,
                extensions,
            ]
            .concat(),
        );

        let mut sig_bits = vec![0x00];
        sig_bits.extend_from_slice(&self.sign(&tbs));
        tlv(0x30, &[tbs, sig_alg, tlv(0x03, &sig_bits)].concat())
    }
}

/// Authenticator data without the attested credential tail (37 bytes).
pub fn assertion_auth_data(flags: u8, sign_count: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&rp_id_hash());
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data
}

/// P-256 public key as a COSE_Key CBOR map (kty=2, alg=-7, crv=1, x, y).
pub fn encode_cose_key(x: &[u8], y: &[u8]) -> Vec<u8> {
    let map = CborValue::Map(vec![
        (CborValue::Integer(1i64.into()), CborValue::Integer(2i64.into())),
        (CborValue::Integer(3i64.into()), CborValue::Integer((-7i64).into())),
        (CborValue::Integer((-1i64).into()), CborValue::Integer(1i64.into())),
        (CborValue::Integer((-2i64).into()), CborValue::Bytes(x.to_vec())),
        (CborValue::Integer((-3i64).into()), CborValue::Bytes(y.to_vec())),
    ]);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&map, &mut buf).unwrap();
    buf
}

pub fn encode_attestation_object(fmt: &str, auth_data: &[u8], sig: &[u8], cert: &[u8]) -> Vec<u8> {
    let map = CborValue::Map(vec![
        (
            CborValue::Text("fmt".to_string()),
            CborValue::Text(fmt.to_string()),
        ),
        (
            CborValue::Text("authData".to_string()),
            CborValue::Bytes(auth_data.to_vec()),
        ),
        (
            CborValue::Text("attStmt".to_string()),
            CborValue::Map(vec![
                (
                    CborValue::Text("sig".to_string()),
                    CborValue::Bytes(sig.to_vec()),
                ),
                (
                    CborValue::Text("x5c".to_string()),
                    CborValue::Array(vec![CborValue::Bytes(cert.to_vec())]),
                ),
            ]),
        ),
    ]);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&map, &mut buf).unwrap();
    buf
}

// DER object identifier contents
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01]; // 1.2.840.10045.2.1
const OID_PRIME256V1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]; // 1.2.840.10045.3.1.7
const OID_ECDSA_WITH_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02]; // 1.2.840.10045.4.3.2
const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03]; // 2.5.4.3
const OID_BASIC_CONSTRAINTS: &[u8] = &[0x55, 0x1D, 0x13]; // 2.5.29.19

/// DER tag-length-value with definite long-form lengths where needed.
fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 128 {
        out.push(len as u8);
    } else if len < 256 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
    out.extend_from_slice(content);
    out
}

fn oid(contents: &[u8]) -> Vec<u8> {
    tlv(0x06, contents)
}
