use ring::{digest, signature::UnparsedPublicKey};

use crate::passkey::config::RpConfig;
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::{ChallengeLedger, CredentialStore};
use crate::passkey::types::CredentialPublicKey;
use crate::utils::base64url_decode;

use super::checks::{CeremonyType, check_sign_count, run_common_checks};
use super::types::{
    AllowCredential, AuthenticationOptions, AuthenticationStatus, AuthenticatorAssertionResponse,
    AuthenticatorData, ParsedClientData,
};

/// Begin a login ceremony: issue a challenge and list the identity's
/// enrolled credential ids. Fails with a not-found error for an unknown
/// identity.
pub fn start_authentication(
    config: &RpConfig,
    store: &CredentialStore,
    challenges: &mut ChallengeLedger,
    identity: &str,
) -> Result<AuthenticationOptions, PasskeyError> {
    let user = store
        .get_user(identity)
        .ok_or_else(|| PasskeyError::NotFound(format!("Unknown identity: {identity}")))?;

    let allow_credentials = user
        .credential_ids()
        .map(|id| AllowCredential {
            type_: "public-key".to_string(),
            id: id.to_string(),
        })
        .collect();

    let challenge = challenges.issue(identity)?;
    let options = AuthenticationOptions {
        challenge,
        allow_credentials,
    };
    tracing::debug!("Authentication options for {}: {options:?}", config.rp_id);
    Ok(options)
}

/// Finish a login ceremony.
///
/// The outstanding challenge is consumed up front, regardless of outcome.
/// After the shared conformance checks and the sign-counter policy, the
/// assertion signature is verified against the stored public key; on
/// success only the observed counter is committed.
pub fn finish_authentication(
    config: &RpConfig,
    store: &mut CredentialStore,
    challenges: &mut ChallengeLedger,
    identity: &str,
    assertion: &AuthenticatorAssertionResponse,
) -> Result<AuthenticationStatus, PasskeyError> {
    let issued_challenge = challenges.consume(identity);

    let client_data = ParsedClientData::from_base64(&assertion.client_data_json)?;
    let auth_data = AuthenticatorData::from_base64(&assertion.authenticator_data)?;

    run_common_checks(
        CeremonyType::Authentication,
        config,
        &client_data,
        &auth_data,
        issued_challenge.as_deref(),
    )?;

    if let Some(user_handle) = &assertion.user_handle {
        // Observed but not verified
        tracing::debug!("Assertion carries user handle: {user_handle}");
    }

    let (stored_key, stored_sign_count) = {
        let record = store.find_authenticator(identity, &assertion.credential_id)?;
        (record.public_key.clone(), record.sign_count)
    };

    check_sign_count(auth_data.sign_count, stored_sign_count)?;

    let signature = base64url_decode(&assertion.signature)
        .map_err(|e| PasskeyError::MalformedInput(format!("Invalid signature: {e}")))?;
    verify_assertion_signature(&stored_key, &auth_data, &client_data, &signature)?;

    if auth_data.sign_count != 0 {
        store.update_sign_count(identity, &assertion.credential_id, auth_data.sign_count)?;
    }

    tracing::info!("Authenticated identity {identity}");
    Ok(AuthenticationStatus::authenticated())
}

/// Verify the assertion signature over `authenticatorData || SHA-256(clientData)`.
///
/// The payload deliberately differs from the enrollment framing: plain
/// concatenation, no leading marker byte. The stored raw point together
/// with the P-256/SHA-256 algorithm identifier forms the verification key.
fn verify_assertion_signature(
    public_key: &CredentialPublicKey,
    auth_data: &AuthenticatorData,
    client_data: &ParsedClientData,
    signature: &[u8],
) -> Result<(), PasskeyError> {
    let verification_algorithm = &ring::signature::ECDSA_P256_SHA256_ASN1;
    let unparsed_public_key = UnparsedPublicKey::new(verification_algorithm, public_key.as_bytes());

    let client_data_hash = digest::digest(&digest::SHA256, &client_data.raw_data);
    let mut signed_data = Vec::with_capacity(auth_data.raw_data.len() + 32);
    signed_data.extend_from_slice(&auth_data.raw_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    match unparsed_public_key.verify(&signed_data, signature) {
        Ok(()) => {
            tracing::debug!("Assertion signature verification successful");
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Assertion signature verification failed: {e:?}");
            Err(PasskeyError::SignatureInvalid)
        }
    }
}
