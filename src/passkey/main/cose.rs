use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::CredentialPublicKey;

// COSE_Key field labels and the constants an ES256 credential must carry
const COSE_KTY: i128 = 1;
const COSE_ALG: i128 = 3;
const COSE_CRV: i128 = -1;
const COSE_X: i128 = -2;
const COSE_Y: i128 = -3;

const KTY_EC2: i128 = 2;
const CRV_P256: i128 = 1;
const ALG_ES256: i128 = -7;

/// Convert a COSE_Key CBOR map into the raw uncompressed point form
/// required by the U2F signature framings.
///
/// The map must describe an EC2 key on P-256 with 32-byte coordinates;
/// anything else is an unsupported key.
pub(crate) fn cose_key_to_point(public_key: &CborValue) -> Result<CredentialPublicKey, PasskeyError> {
    let CborValue::Map(map) = public_key else {
        return Err(PasskeyError::MalformedInput(
            "COSE key is not a CBOR map".to_string(),
        ));
    };

    let mut kty = None;
    let mut alg = None;
    let mut crv = None;
    let mut x = None;
    let mut y = None;

    for (key, value) in map {
        let CborValue::Integer(label) = key else {
            continue;
        };
        match (i128::from(*label), value) {
            (COSE_KTY, CborValue::Integer(v)) => kty = Some(i128::from(*v)),
            (COSE_ALG, CborValue::Integer(v)) => alg = Some(i128::from(*v)),
            (COSE_CRV, CborValue::Integer(v)) => crv = Some(i128::from(*v)),
            (COSE_X, CborValue::Bytes(v)) => x = Some(v),
            (COSE_Y, CborValue::Bytes(v)) => y = Some(v),
            _ => {}
        }
    }

    if kty != Some(KTY_EC2) {
        return Err(PasskeyError::UnsupportedFormat(format!(
            "Unsupported key type: {kty:?}"
        )));
    }
    if crv != Some(CRV_P256) {
        return Err(PasskeyError::UnsupportedFormat(format!(
            "Unsupported curve: {crv:?}"
        )));
    }
    if let Some(alg) = alg {
        if alg != ALG_ES256 {
            tracing::debug!("COSE key declares algorithm {alg}, expected ES256 (-7)");
        }
    }

    let (x, y) = match (x, y) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(PasskeyError::MalformedInput(
                "Missing key coordinates".to_string(),
            ));
        }
    };

    CredentialPublicKey::from_coordinates(x, y)
}
