use ring::digest;
use uuid::Uuid;

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::CredentialPublicKey;

use super::super::types::{AttestationObject, AuthenticatorData};
use super::u2f::verify_u2f_attestation;

/// Verify an enrollment's attestation statement.
///
/// Dispatches on the statement format; only the fido-u2f baseline is
/// supported, and an unknown format fails before any signature work.
pub(crate) fn verify_attestation(
    attestation: &AttestationObject,
    auth_data: &AuthenticatorData,
    credential_public_key: &CredentialPublicKey,
    client_data: &[u8],
) -> Result<(), PasskeyError> {
    let client_data_hash = digest::digest(&digest::SHA256, client_data);

    match attestation.fmt.as_str() {
        "fido-u2f" => {
            tracing::debug!("Using 'fido-u2f' attestation format");
            verify_u2f_attestation(
                auth_data,
                credential_public_key,
                client_data_hash.as_ref(),
                &attestation.att_stmt,
            )
        }
        other => {
            tracing::warn!("Unsupported attestation format: {other}");
            Err(PasskeyError::UnsupportedFormat(format!(
                "Unsupported attestation format: {other}"
            )))
        }
    }
}

/// Format the embedded AAGUID as a hyphenated UUID string.
pub(crate) fn extract_aaguid(auth_data: &AuthenticatorData) -> Result<String, PasskeyError> {
    let attested = auth_data.attested_credential.as_ref().ok_or_else(|| {
        PasskeyError::MalformedInput("No attested credential data present".to_string())
    })?;
    let aaguid = Uuid::from_slice(&attested.aaguid)
        .map_err(|e| PasskeyError::MalformedInput(format!("Failed to parse AAGUID: {e}")))?
        .hyphenated()
        .to_string();
    Ok(aaguid)
}
