use ciborium::value::Value as CborValue;
use serde::{Deserialize, Serialize};

use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;

/// Options returned by a registration begin-call, in the dictionary shape
/// `navigator.credentials.create()` expects.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: PublicKeyCredentialUserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub attestation: String,
}

#[derive(Serialize, Debug)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PublicKeyCredentialUserEntity {
    pub id: String,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Serialize, Debug)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i32,
}

/// Options returned by an authentication begin-call, in the dictionary shape
/// `navigator.credentials.get()` expects.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub challenge: String,
    pub allow_credentials: Vec<AllowCredential>,
}

#[derive(Serialize, Debug)]
pub struct AllowCredential {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

/// Credential data submitted by the client to finish a registration.
#[derive(Deserialize, Debug)]
pub struct RegisterCredential {
    pub response: AuthenticatorAttestationResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponse {
    /// base64url CBOR attestation object
    pub attestation_object: String,
    /// base64url client data JSON
    pub client_data_json: String,
}

/// Assertion submitted by the client to finish an authentication.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponse {
    /// base64url credential id selecting the stored public key
    pub credential_id: String,
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default)]
    pub user_handle: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RegistrationStatus {
    pub status: String,
}

impl RegistrationStatus {
    pub(crate) fn registered() -> Self {
        Self {
            status: "registered".to_string(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AuthenticationStatus {
    pub status: String,
}

impl AuthenticationStatus {
    pub(crate) fn authenticated() -> Self {
        Self {
            status: "authenticated".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TokenBinding {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ClientDataJson {
    #[serde(rename = "type")]
    type_: String,
    challenge: String,
    origin: String,
    #[serde(rename = "tokenBinding", default)]
    token_binding: Option<TokenBinding>,
}

/// Client data as parsed from the UTF-8 JSON the browser produced.
///
/// Always compare properties after a real JSON parse; matching on the whole
/// string breaks as soon as the client adds a field.
#[derive(Debug)]
pub struct ParsedClientData {
    pub type_: String,
    pub challenge: String,
    pub origin: String,
    pub token_binding: Option<TokenBinding>,
    /// Raw bytes, kept for hashing into the signed payloads
    pub raw_data: Vec<u8>,
}

impl ParsedClientData {
    pub fn from_base64(client_data_json: &str) -> Result<Self, PasskeyError> {
        let raw_data = base64url_decode(client_data_json)
            .map_err(|e| PasskeyError::MalformedInput(format!("Failed to decode: {e}")))?;
        Self::parse(raw_data)
    }

    pub fn parse(raw_data: Vec<u8>) -> Result<Self, PasskeyError> {
        let data_str = std::str::from_utf8(&raw_data)
            .map_err(|e| PasskeyError::MalformedInput(format!("Invalid UTF-8: {e}")))?;

        let data: ClientDataJson = serde_json::from_str(data_str)
            .map_err(|e| PasskeyError::MalformedInput(format!("Invalid client data JSON: {e}")))?;

        Ok(Self {
            type_: data.type_,
            challenge: data.challenge,
            origin: data.origin,
            token_binding: data.token_binding,
            raw_data,
        })
    }
}

/// Flags in authenticator data.
pub(crate) mod auth_data_flags {
    /// User Present (UP) - Bit 0
    pub(crate) const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub(crate) const UV: u8 = 1 << 2;
    /// Attested Credential Data Included (AT) - Bit 6
    pub(crate) const AT: u8 = 1 << 6;
    /// Extension Data Included (ED) - Bit 7
    pub(crate) const ED: u8 = 1 << 7;
}

/// Credential material embedded in authenticator data when the AT flag is set.
#[derive(Debug)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// COSE public key, still CBOR; converted to a raw point by the COSE
    /// key converter
    pub public_key: CborValue,
}

/// Authenticator data, decoded from the wire bytes.
///
/// Layout (minimum 37 bytes):
/// - RP ID hash (32 bytes)
/// - Flags (1 byte)
/// - Sign counter (4 bytes, big-endian)
/// - When AT is set: AAGUID (16), credential id length (2, big-endian),
///   credential id, COSE public key (CBOR map, remainder)
#[derive(Debug)]
pub struct AuthenticatorData {
    pub rp_id_hash: Vec<u8>,
    pub flags: u8,
    pub sign_count: u32,
    pub attested_credential: Option<AttestedCredentialData>,
    /// Raw bytes, kept for the assertion signature payload
    pub raw_data: Vec<u8>,
}

impl AuthenticatorData {
    pub fn from_base64(auth_data: &str) -> Result<Self, PasskeyError> {
        let data = base64url_decode(auth_data)
            .map_err(|e| PasskeyError::MalformedInput(format!("Failed to decode: {e}")))?;
        Self::parse(data)
    }

    /// Decode the binary structure. Pure; no side effects.
    pub fn parse(data: Vec<u8>) -> Result<Self, PasskeyError> {
        if data.len() < 37 {
            return Err(PasskeyError::MalformedInput(format!(
                "Authenticator data too short: {} bytes",
                data.len()
            )));
        }

        let rp_id_hash = data[..32].to_vec();
        let flags = data[32];
        let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

        let attested_credential = if flags & auth_data_flags::AT != 0 {
            Some(Self::parse_attested_credential(&data)?)
        } else {
            None
        };

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential,
            raw_data: data,
        })
    }

    fn parse_attested_credential(data: &[u8]) -> Result<AttestedCredentialData, PasskeyError> {
        if data.len() < 55 {
            return Err(PasskeyError::MalformedInput(
                "Authenticator data too short for attested credential data".to_string(),
            ));
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&data[37..53]);

        let credential_id_len = u16::from_be_bytes([data[53], data[54]]) as usize;
        let credential_id_end = 55 + credential_id_len;
        if data.len() < credential_id_end {
            return Err(PasskeyError::MalformedInput(format!(
                "Declared credential id length {} exceeds remaining {} bytes",
                credential_id_len,
                data.len() - 55
            )));
        }
        let credential_id = data[55..credential_id_end].to_vec();

        let public_key: CborValue = ciborium::de::from_reader(&data[credential_id_end..])
            .map_err(|e| PasskeyError::MalformedInput(format!("Invalid public key CBOR: {e}")))?;
        if !matches!(public_key, CborValue::Map(_)) {
            return Err(PasskeyError::MalformedInput(
                "Credential public key is not a CBOR map".to_string(),
            ));
        }

        Ok(AttestedCredentialData {
            aaguid,
            credential_id,
            public_key,
        })
    }

    pub fn is_user_present(&self) -> bool {
        (self.flags & auth_data_flags::UP) != 0
    }

    pub fn is_user_verified(&self) -> bool {
        (self.flags & auth_data_flags::UV) != 0
    }

    pub fn has_attested_credential_data(&self) -> bool {
        (self.flags & auth_data_flags::AT) != 0
    }

    pub fn has_extension_data(&self) -> bool {
        (self.flags & auth_data_flags::ED) != 0
    }
}

/// Attestation object fields: format, authenticator data, statement.
#[derive(Debug)]
pub struct AttestationObject {
    pub fmt: String,
    pub auth_data: Vec<u8>,
    pub att_stmt: Vec<(CborValue, CborValue)>,
}

impl AttestationObject {
    pub fn from_base64(attestation_base64: &str) -> Result<Self, PasskeyError> {
        let attestation_bytes = base64url_decode(attestation_base64).map_err(|e| {
            PasskeyError::MalformedInput(format!("Failed to decode attestation object: {e}"))
        })?;
        Self::parse(&attestation_bytes)
    }

    pub fn parse(attestation_bytes: &[u8]) -> Result<Self, PasskeyError> {
        let attestation_cbor: CborValue = ciborium::de::from_reader(attestation_bytes)
            .map_err(|e| PasskeyError::MalformedInput(format!("Invalid CBOR data: {e}")))?;

        let CborValue::Map(map) = attestation_cbor else {
            return Err(PasskeyError::MalformedInput(
                "Attestation object is not a CBOR map".to_string(),
            ));
        };

        let mut fmt = None;
        let mut auth_data = None;
        let mut att_stmt = None;

        for (key, value) in map {
            if let CborValue::Text(k) = key {
                match k.as_str() {
                    "fmt" => {
                        if let CborValue::Text(f) = value {
                            fmt = Some(f);
                        }
                    }
                    "authData" => {
                        if let CborValue::Bytes(data) = value {
                            auth_data = Some(data);
                        }
                    }
                    "attStmt" => {
                        if let CborValue::Map(stmt) = value {
                            att_stmt = Some(stmt);
                        }
                    }
                    _ => {}
                }
            }
        }

        match (fmt, auth_data, att_stmt) {
            (Some(fmt), Some(auth_data), Some(att_stmt)) => Ok(Self {
                fmt,
                auth_data,
                att_stmt,
            }),
            _ => Err(PasskeyError::MalformedInput(
                "Missing required attestation object fields".to_string(),
            )),
        }
    }
}
