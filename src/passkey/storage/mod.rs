use std::collections::HashMap;

use crate::utils::gen_random_string;

use super::errors::{ConformanceCheck, PasskeyError};
use super::types::{AuthenticatorRecord, UserRecord};

/// In-memory map from identity to enrolled authenticators.
///
/// Volatile: records live for the process lifetime and are lost on restart.
/// The store carries no internal locking; callers must serialize ceremonies
/// per identity (see the crate-level documentation).
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, UserRecord>,
}

impl CredentialStore {
    pub fn new() -> Self {
        tracing::debug!("Creating new in-memory credential store");
        Self::default()
    }

    /// Create the record for an identity if it does not exist yet.
    ///
    /// Later begin-calls must not wipe already-enrolled authenticators.
    pub(crate) fn ensure_user(&mut self, identity: &str) -> &mut UserRecord {
        self.users.entry(identity.to_string()).or_default()
    }

    pub fn get_user(&self, identity: &str) -> Option<&UserRecord> {
        self.users.get(identity)
    }

    /// Whether a credential id is registered to any identity.
    pub fn credential_id_in_use(&self, credential_id: &str) -> bool {
        self.users
            .values()
            .any(|user| user.authenticators.contains_key(credential_id))
    }

    /// Commit a verified enrollment.
    ///
    /// Credential ids must be globally unique across all identities; a clash
    /// is rejected here, at commit time, as a conformance failure.
    pub(crate) fn add_authenticator(
        &mut self,
        identity: &str,
        record: AuthenticatorRecord,
    ) -> Result<(), PasskeyError> {
        if self.credential_id_in_use(&record.credential_id) {
            tracing::warn!(
                "Rejecting enrollment: credential id {} is already registered",
                record.credential_id
            );
            return Err(PasskeyError::Conformance(ConformanceCheck::CredentialIdUnique));
        }
        let user = self
            .users
            .get_mut(identity)
            .ok_or_else(|| PasskeyError::NotFound(format!("Unknown identity: {identity}")))?;
        tracing::debug!(
            "Storing credential {} for identity {}",
            record.credential_id,
            identity
        );
        user.authenticators
            .insert(record.credential_id.clone(), record);
        Ok(())
    }

    pub(crate) fn find_authenticator(
        &self,
        identity: &str,
        credential_id: &str,
    ) -> Result<&AuthenticatorRecord, PasskeyError> {
        self.users
            .get(identity)
            .ok_or_else(|| PasskeyError::NotFound(format!("Unknown identity: {identity}")))?
            .authenticators
            .get(credential_id)
            .ok_or_else(|| PasskeyError::NotFound("Credential not found".to_string()))
    }

    pub(crate) fn update_sign_count(
        &mut self,
        identity: &str,
        credential_id: &str,
        sign_count: u32,
    ) -> Result<(), PasskeyError> {
        let record = self
            .users
            .get_mut(identity)
            .and_then(|user| user.authenticators.get_mut(credential_id))
            .ok_or_else(|| PasskeyError::NotFound("Credential not found".to_string()))?;
        tracing::debug!(
            "Updating sign counter for {}: {} -> {}",
            credential_id,
            record.sign_count,
            sign_count
        );
        record.sign_count = sign_count;
        record.last_used_at = chrono::Utc::now();
        Ok(())
    }
}

/// Outstanding per-identity challenges.
///
/// Each challenge is 32 random bytes (base64url on the wire), bound 1:1 to a
/// pending ceremony for one identity, and consumed the moment the matching
/// finish-call is evaluated, regardless of outcome. No TTL is applied; a
/// production deployment should expire outstanding challenges.
#[derive(Debug, Default)]
pub struct ChallengeLedger {
    challenges: HashMap<String, String>,
}

impl ChallengeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh challenge for an identity, replacing any outstanding one.
    pub(crate) fn issue(&mut self, identity: &str) -> Result<String, PasskeyError> {
        let challenge = gen_random_string(32)?;
        tracing::debug!("Issued challenge for identity {identity}");
        self.challenges
            .insert(identity.to_string(), challenge.clone());
        Ok(challenge)
    }

    /// Take the outstanding challenge for an identity, invalidating it.
    pub(crate) fn consume(&mut self, identity: &str) -> Option<String> {
        let challenge = self.challenges.remove(identity);
        if challenge.is_none() {
            tracing::warn!("No outstanding challenge for identity {identity}");
        }
        challenge
    }
}
