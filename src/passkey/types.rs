use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::PasskeyError;

/// An elliptic-curve public key in raw uncompressed point form.
///
/// Invariant: exactly 65 bytes, leading byte 0x04, followed by the two
/// 32-byte P-256 coordinates. This is the form the legacy (U2F) signature
/// framings verify against, not the CBOR encoding the authenticator emits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPublicKey(#[serde(with = "pubkey_bytes")] [u8; 65]);

/// serde glue for the 65-byte point: serde has no built-in impls for arrays
/// larger than 32, so the uncompressed point is (de)serialized as a byte
/// sequence and re-checked for length on the way back in.
mod pubkey_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 65], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 65], D::Error> {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("expected 65 bytes for uncompressed point"))
    }
}

impl CredentialPublicKey {
    /// Assemble the point from the two 32-byte coordinates.
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, PasskeyError> {
        if x.len() != 32 || y.len() != 32 {
            return Err(PasskeyError::UnsupportedFormat(format!(
                "Coordinates must be 32 bytes each, got x={} y={}",
                x.len(),
                y.len()
            )));
        }
        let mut point = [0u8; 65];
        point[0] = 0x04;
        point[1..33].copy_from_slice(x);
        point[33..65].copy_from_slice(y);
        Ok(Self(point))
    }

    /// Accept a stored point, re-checking the shape invariant.
    pub fn from_uncompressed(bytes: &[u8]) -> Result<Self, PasskeyError> {
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(PasskeyError::MalformedInput(
                "Public key must be a 65-byte uncompressed point starting with 0x04".to_string(),
            ));
        }
        let mut point = [0u8; 65];
        point.copy_from_slice(bytes);
        Ok(Self(point))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn x(&self) -> &[u8] {
        &self.0[1..33]
    }

    pub fn y(&self) -> &[u8] {
        &self.0[33..65]
    }
}

impl std::fmt::Debug for CredentialPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialPublicKey({})", crate::utils::base64url_encode(self.0))
    }
}

/// A stored authenticator enrolled for one identity.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthenticatorRecord {
    /// Credential id, base64url
    pub credential_id: String,
    /// Raw uncompressed public-key point
    pub public_key: CredentialPublicKey,
    /// Replay counter as last observed
    pub sign_count: u32,
    /// AAGUID of the authenticator, hyphenated
    pub aaguid: String,
    pub registered_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// All authenticators enrolled for one identity.
///
/// Created by the first registration begin-call and never deleted; lifetime
/// equals the process lifetime.
#[derive(Clone, Debug, Default)]
pub struct UserRecord {
    pub(crate) authenticators: HashMap<String, AuthenticatorRecord>,
}

impl UserRecord {
    /// Credential ids usable in allowCredentials, base64url.
    pub fn credential_ids(&self) -> impl Iterator<Item = &str> {
        self.authenticators.keys().map(String::as_str)
    }

    pub fn get(&self, credential_id: &str) -> Option<&AuthenticatorRecord> {
        self.authenticators.get(credential_id)
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_from_coordinates_layout() {
        let x = [0xAA; 32];
        let y = [0xBB; 32];
        let key = CredentialPublicKey::from_coordinates(&x, &y).unwrap();
        let bytes = key.as_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
        assert_eq!(&bytes[1..33], &x);
        assert_eq!(&bytes[33..65], &y);
        assert_eq!(key.x(), &x);
        assert_eq!(key.y(), &y);
    }

    #[test]
    fn test_point_rejects_short_coordinate() {
        let result = CredentialPublicKey::from_coordinates(&[0u8; 31], &[0u8; 32]);
        assert!(matches!(result, Err(PasskeyError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_from_uncompressed_requires_04_prefix() {
        let mut bytes = [0u8; 65];
        bytes[0] = 0x02;
        assert!(matches!(
            CredentialPublicKey::from_uncompressed(&bytes),
            Err(PasskeyError::MalformedInput(_))
        ));
        bytes[0] = 0x04;
        assert!(CredentialPublicKey::from_uncompressed(&bytes).is_ok());
    }

    #[test]
    fn test_from_uncompressed_requires_65_bytes() {
        assert!(CredentialPublicKey::from_uncompressed(&[0x04; 64]).is_err());
        assert!(CredentialPublicKey::from_uncompressed(&[0x04; 66]).is_err());
    }
}
