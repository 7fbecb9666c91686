use ciborium::value::Value as CborValue;
use webpki::EndEntityCert;
use x509_parser::{certificate::X509Certificate, prelude::FromDer};

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::CredentialPublicKey;

use super::super::types::AuthenticatorData;

/// Verify a FIDO-U2F attestation statement.
///
/// The statement must carry exactly one DER certificate and a DER ECDSA
/// signature. The signature covers
/// `0x00 || rpIdHash || clientDataHash || credentialId || rawPoint`
/// and is checked as ECDSA P-256/SHA-256 against the public key conveyed by
/// the certificate. Certificate chain, expiry and trust-anchor processing
/// are out of scope.
pub(super) fn verify_u2f_attestation(
    auth_data: &AuthenticatorData,
    credential_public_key: &CredentialPublicKey,
    client_data_hash: &[u8],
    att_stmt: &[(CborValue, CborValue)],
) -> Result<(), PasskeyError> {
    let mut sig: Option<&[u8]> = None;
    let mut x5c: Option<Vec<&[u8]>> = None;

    for (key, value) in att_stmt {
        let CborValue::Text(key_str) = key else {
            continue;
        };
        match key_str.as_str() {
            "sig" => {
                if let CborValue::Bytes(s) = value {
                    sig = Some(s);
                }
            }
            "x5c" => {
                if let CborValue::Array(certs) = value {
                    let cert_chain: Vec<&[u8]> = certs
                        .iter()
                        .filter_map(|cert| match cert {
                            CborValue::Bytes(bytes) => Some(bytes.as_slice()),
                            _ => None,
                        })
                        .collect();
                    x5c = Some(cert_chain);
                }
            }
            other => {
                tracing::debug!("Unexpected key in U2F attestation statement: {other}");
            }
        }
    }

    let sig = sig.ok_or_else(|| {
        PasskeyError::MalformedInput("Missing signature in U2F attestation".to_string())
    })?;
    let x5c = x5c.ok_or_else(|| {
        PasskeyError::MalformedInput("Missing x5c in U2F attestation".to_string())
    })?;

    // x5c must contain exactly one element
    if x5c.len() != 1 {
        return Err(PasskeyError::MalformedInput(format!(
            "U2F attestation must carry exactly one certificate, got {}",
            x5c.len()
        )));
    }
    let attestn_cert_bytes = x5c[0];

    let attestn_cert = EndEntityCert::try_from(attestn_cert_bytes).map_err(|e| {
        PasskeyError::MalformedInput(format!("Failed to parse U2F attestation certificate: {e:?}"))
    })?;

    // An attestation certificate must be an end-entity certificate
    let (_, x509_cert) = X509Certificate::from_der(attestn_cert_bytes).map_err(|e| {
        PasskeyError::MalformedInput(format!("Failed to parse X509 certificate: {e}"))
    })?;
    if let Some(basic_constraints) = x509_cert
        .extensions()
        .iter()
        .find(|ext| ext.oid.as_bytes() == oid_registry::OID_X509_EXT_BASIC_CONSTRAINTS.as_bytes())
    {
        if basic_constraints.value.contains(&0x01) {
            return Err(PasskeyError::MalformedInput(
                "U2F attestation certificate must not be a CA certificate".to_string(),
            ));
        }
    }

    let attested = auth_data.attested_credential.as_ref().ok_or_else(|| {
        PasskeyError::MalformedInput("No attested credential data present".to_string())
    })?;

    // verificationData = 0x00 || rpIdHash || clientDataHash || credentialId || rawPoint
    let mut verification_data =
        Vec::with_capacity(1 + 32 + client_data_hash.len() + attested.credential_id.len() + 65);
    verification_data.push(0x00);
    verification_data.extend_from_slice(&auth_data.rp_id_hash);
    verification_data.extend_from_slice(client_data_hash);
    verification_data.extend_from_slice(&attested.credential_id);
    verification_data.extend_from_slice(credential_public_key.as_bytes());

    attestn_cert
        .verify_signature(&webpki::ECDSA_P256_SHA256, &verification_data, sig)
        .map_err(|e| {
            tracing::warn!("U2F attestation signature invalid: {e:?}");
            PasskeyError::SignatureInvalid
        })?;

    tracing::debug!("FIDO-U2F attestation verification successful");
    Ok(())
}
