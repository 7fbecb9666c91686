use crate::passkey::config::RpConfig;
use crate::passkey::errors::{ConformanceCheck, PasskeyError};

use super::types::{AuthenticatorData, ParsedClientData};

/// The two ceremony variants, dispatched to distinct verifiers but sharing
/// one conformance-check sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CeremonyType {
    Registration,
    Authentication,
}

impl CeremonyType {
    pub(crate) fn expected_client_data_type(self) -> &'static str {
        match self {
            CeremonyType::Registration => "webauthn.create",
            CeremonyType::Authentication => "webauthn.get",
        }
    }
}

/// Check 1: clientData.type equals the ceremony-specific constant.
pub(crate) fn check_ceremony_type(
    ceremony: CeremonyType,
    client_data: &ParsedClientData,
) -> Result<(), PasskeyError> {
    if client_data.type_ != ceremony.expected_client_data_type() {
        tracing::warn!(
            "Invalid client data type: expected {}, got {}",
            ceremony.expected_client_data_type(),
            client_data.type_
        );
        return Err(PasskeyError::Conformance(ConformanceCheck::CeremonyType));
    }
    Ok(())
}

/// Check 2: clientData.challenge equals the challenge issued for this
/// identity. Opaque string comparison; a consumed or never-issued challenge
/// fails the same check.
pub(crate) fn check_challenge(
    client_data: &ParsedClientData,
    issued_challenge: Option<&str>,
) -> Result<(), PasskeyError> {
    match issued_challenge {
        Some(challenge) if client_data.challenge == challenge => Ok(()),
        Some(_) => {
            tracing::warn!("Challenge mismatch");
            Err(PasskeyError::Conformance(ConformanceCheck::Challenge))
        }
        None => {
            tracing::warn!("No outstanding challenge for this identity");
            Err(PasskeyError::Conformance(ConformanceCheck::Challenge))
        }
    }
}

/// Check 3: clientData.origin equals the relying-party origin.
pub(crate) fn check_origin(
    config: &RpConfig,
    client_data: &ParsedClientData,
) -> Result<(), PasskeyError> {
    if client_data.origin != config.origin {
        tracing::warn!(
            "Invalid origin: expected {}, got {}",
            config.origin,
            client_data.origin
        );
        return Err(PasskeyError::Conformance(ConformanceCheck::Origin));
    }
    Ok(())
}

/// Check 4: tokenBinding, when present, must carry status "not-supported".
pub(crate) fn check_token_binding(client_data: &ParsedClientData) -> Result<(), PasskeyError> {
    if let Some(token_binding) = &client_data.token_binding {
        if token_binding.status != "not-supported" {
            tracing::warn!("Invalid token binding status: {}", token_binding.status);
            return Err(PasskeyError::Conformance(ConformanceCheck::TokenBinding));
        }
    }
    Ok(())
}

/// Check 5: rpIdHash equals SHA-256 of the relying-party id.
pub(crate) fn check_rp_id_hash(
    config: &RpConfig,
    auth_data: &AuthenticatorData,
) -> Result<(), PasskeyError> {
    if auth_data.rp_id_hash != config.rp_id_hash() {
        tracing::warn!("rpIdHash does not match SHA-256 of {}", config.rp_id);
        return Err(PasskeyError::Conformance(ConformanceCheck::RpIdHash));
    }
    Ok(())
}

/// Check 6: the UserPresent flag bit must be set.
pub(crate) fn check_user_present(auth_data: &AuthenticatorData) -> Result<(), PasskeyError> {
    if !auth_data.is_user_present() {
        tracing::warn!("User not present, flags: {:#04x}", auth_data.flags);
        return Err(PasskeyError::Conformance(ConformanceCheck::UserPresent));
    }
    Ok(())
}

/// Check 7: the UserVerified flag bit must be clear; verification is never
/// requested by this relying party.
pub(crate) fn check_user_not_verified(auth_data: &AuthenticatorData) -> Result<(), PasskeyError> {
    if auth_data.is_user_verified() {
        tracing::warn!("Unexpected UserVerified flag, flags: {:#04x}", auth_data.flags);
        return Err(PasskeyError::Conformance(ConformanceCheck::UserVerified));
    }
    Ok(())
}

/// Check 8 (enrollment only): the ExtensionDataIncluded flag bit must be clear.
pub(crate) fn check_no_extension_data(auth_data: &AuthenticatorData) -> Result<(), PasskeyError> {
    if auth_data.has_extension_data() {
        tracing::warn!("Unexpected extension data, flags: {:#04x}", auth_data.flags);
        return Err(PasskeyError::Conformance(ConformanceCheck::ExtensionData));
    }
    Ok(())
}

/// Checks 1-7, shared by both ceremonies, evaluated fail-fast in the
/// documented order.
pub(crate) fn run_common_checks(
    ceremony: CeremonyType,
    config: &RpConfig,
    client_data: &ParsedClientData,
    auth_data: &AuthenticatorData,
    issued_challenge: Option<&str>,
) -> Result<(), PasskeyError> {
    check_ceremony_type(ceremony, client_data)?;
    check_challenge(client_data, issued_challenge)?;
    check_origin(config, client_data)?;
    check_token_binding(client_data)?;
    check_rp_id_hash(config, auth_data)?;
    check_user_present(auth_data)?;
    check_user_not_verified(auth_data)?;
    Ok(())
}

/// Sign-counter policy: zero means the authenticator carries no counter and
/// is accepted; otherwise the received value must strictly increase.
pub(crate) fn check_sign_count(received: u32, stored: u32) -> Result<(), PasskeyError> {
    if received == 0 {
        tracing::debug!("Authenticator does not support counters");
        return Ok(());
    }
    if received <= stored {
        tracing::warn!(
            "Sign counter did not increase: stored {stored}, received {received}; \
             possible credential cloning"
        );
        return Err(PasskeyError::Conformance(ConformanceCheck::SignCount));
    }
    Ok(())
}
