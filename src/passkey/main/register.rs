use chrono::Utc;

use crate::passkey::config::RpConfig;
use crate::passkey::errors::PasskeyError;
use crate::passkey::storage::{ChallengeLedger, CredentialStore};
use crate::passkey::types::AuthenticatorRecord;
use crate::utils::base64url_encode;

use super::attestation::{extract_aaguid, verify_attestation};
use super::checks::{CeremonyType, check_no_extension_data, run_common_checks};
use super::cose::cose_key_to_point;
use super::types::{
    AttestationObject, AuthenticatorData, ParsedClientData, PubKeyCredParam, PublicKeyCredentialUserEntity,
    RegisterCredential, RegistrationOptions, RegistrationStatus, RelyingParty,
};

/// Begin an enrollment ceremony: create the user record if this is the
/// identity's first enrollment, issue a challenge and return the credential
/// creation options.
pub fn start_registration(
    config: &RpConfig,
    store: &mut CredentialStore,
    challenges: &mut ChallengeLedger,
    identity: &str,
) -> Result<RegistrationOptions, PasskeyError> {
    store.ensure_user(identity);
    let challenge = challenges.issue(identity)?;

    let options = RegistrationOptions {
        challenge,
        rp: RelyingParty {
            id: config.rp_id.clone(),
            name: config.rp_name.clone(),
        },
        user: PublicKeyCredentialUserEntity {
            id: identity.to_string(),
            name: identity.to_string(),
            display_name: identity.to_string(),
        },
        pub_key_cred_params: vec![PubKeyCredParam {
            type_: "public-key".to_string(),
            alg: -7,
        }],
        attestation: "direct".to_string(),
    };

    tracing::debug!("Registration options: {options:?}");
    Ok(options)
}

/// Finish an enrollment ceremony.
///
/// The outstanding challenge is consumed up front, regardless of outcome.
/// Inputs are then decoded, the conformance checks run fail-fast in the
/// documented order, the attestation signature is verified, and only after
/// everything has passed is the new authenticator committed to the store.
pub fn finish_registration(
    config: &RpConfig,
    store: &mut CredentialStore,
    challenges: &mut ChallengeLedger,
    identity: &str,
    reg_data: &RegisterCredential,
) -> Result<RegistrationStatus, PasskeyError> {
    let issued_challenge = challenges.consume(identity);

    let client_data = ParsedClientData::from_base64(&reg_data.response.client_data_json)?;
    let attestation = AttestationObject::from_base64(&reg_data.response.attestation_object)?;
    let auth_data = AuthenticatorData::parse(attestation.auth_data.clone())?;

    run_common_checks(
        CeremonyType::Registration,
        config,
        &client_data,
        &auth_data,
        issued_challenge.as_deref(),
    )?;
    check_no_extension_data(&auth_data)?;

    let attested = auth_data.attested_credential.as_ref().ok_or_else(|| {
        PasskeyError::MalformedInput("No attested credential data present".to_string())
    })?;
    let public_key = cose_key_to_point(&attested.public_key)?;

    verify_attestation(&attestation, &auth_data, &public_key, &client_data.raw_data)?;

    let aaguid = extract_aaguid(&auth_data)?;
    let credential_id = base64url_encode(&attested.credential_id);
    let now = Utc::now();
    let record = AuthenticatorRecord {
        credential_id: credential_id.clone(),
        public_key,
        sign_count: auth_data.sign_count,
        aaguid,
        registered_at: now,
        last_used_at: now,
    };
    store.add_authenticator(identity, record)?;

    tracing::info!("Registered credential {credential_id} for identity {identity}");
    Ok(RegistrationStatus::registered())
}
