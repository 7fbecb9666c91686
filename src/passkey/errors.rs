use thiserror::Error;

use crate::utils::UtilError;

/// Errors raised while running a WebAuthn ceremony.
///
/// The variants follow the ceremony failure taxonomy: structurally invalid
/// input, a named conformance check failing, an unsupported attestation or
/// key format, a failed cryptographic check, or a missing identity or
/// credential. Every variant aborts the ceremony; registration persists
/// nothing unless all checks including the signature have passed.
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// Error in the relying-party configuration (e.g. an unusable origin)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structurally invalid binary or JSON input
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A named ceremony conformance check failed
    #[error("Conformance check failed: {0}")]
    Conformance(ConformanceCheck),

    /// Unknown attestation statement format or unsupported key type
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The cryptographic signature check failed
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// Unknown identity or credential
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl PasskeyError {
    /// The caller-facing failure string.
    ///
    /// Wire responses must not reveal which check failed; the precise
    /// variant is for internal diagnostics (logs) only.
    pub fn public_message(&self) -> &'static str {
        "ceremony failed"
    }
}

/// The individually named ceremony conformance checks.
///
/// Each check is evaluated fail-fast in the documented order and carries its
/// own failure kind; they are never merged into one generic check.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceCheck {
    /// clientData.type does not match the ceremony ("webauthn.create" / "webauthn.get")
    #[error("client data type mismatch")]
    CeremonyType,

    /// clientData.challenge does not match the issued challenge, or no
    /// challenge is outstanding for the identity
    #[error("challenge mismatch")]
    Challenge,

    /// clientData.origin does not match the relying-party origin
    #[error("origin mismatch")]
    Origin,

    /// clientData.tokenBinding present with a status other than "not-supported"
    #[error("token binding status not supported")]
    TokenBinding,

    /// rpIdHash does not equal SHA-256 of the relying-party id
    #[error("rpIdHash mismatch")]
    RpIdHash,

    /// UserPresent flag bit is not set
    #[error("user not present")]
    UserPresent,

    /// UserVerified flag bit is set although verification is never requested
    #[error("user verified flag set")]
    UserVerified,

    /// ExtensionDataIncluded flag bit is set on an enrollment
    #[error("extension data included")]
    ExtensionData,

    /// Received sign counter did not strictly increase
    #[error("sign counter did not increase")]
    SignCount,

    /// Credential id is already registered, possibly to another identity
    #[error("credential id already registered")]
    CredentialIdUnique,
}
