//! webauthn-u2f - WebAuthn ceremony verification with FIDO-U2F attestation
//!
//! This crate implements the relying-party side of the two WebAuthn
//! ceremonies: enrolling a device-held key pair against a user identity
//! (registration) and validating signed proofs from that device for login
//! (authentication). No shared secret crosses the wire; the server stores
//! only the credential's public key.
//!
//! The core pieces are the binary authenticator-data parser, the COSE key
//! converter producing the raw uncompressed P-256 point the U2F signature
//! framings require, the ordered protocol conformance checks, and the two
//! ECDSA verifiers (attestation at enrollment, assertion at login). HTTP
//! routing, cookie/session handling and static assets are the caller's
//! concern; all operations here are transport-agnostic and synchronous.
//!
//! ```no_run
//! use webauthn_u2f::{ChallengeLedger, CredentialStore, RpConfig, start_registration};
//!
//! let config = RpConfig::new("https://example.com")?;
//! let mut store = CredentialStore::new();
//! let mut challenges = ChallengeLedger::new();
//!
//! let options = start_registration(&config, &mut store, &mut challenges, "alice")?;
//! // serialize `options` for navigator.credentials.create(), then feed the
//! // client's response into finish_registration
//! # Ok::<(), webauthn_u2f::PasskeyError>(())
//! ```
//!
//! # Caller obligations
//!
//! `CredentialStore` and `ChallengeLedger` carry no internal locking.
//! Ceremonies for distinct identities are independent, but concurrent
//! ceremonies for the *same* identity are unsafe unless the surrounding
//! runtime serializes them (e.g. a per-identity lock). Outstanding
//! challenges have no expiry; add a time-to-live in production deployments.
//!
//! # Error handling
//!
//! Every failure aborts the ceremony; registration persists nothing until
//! all checks including the signature have passed. Log the specific
//! [`PasskeyError`] internally, but send callers only
//! [`PasskeyError::public_message`] so a probing attacker learns nothing
//! about which check failed.

mod passkey;
mod utils;

pub use passkey::{
    AllowCredential, AttestationObject, AttestedCredentialData, AuthenticationOptions,
    AuthenticationStatus, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorData, AuthenticatorRecord, ChallengeLedger, ConformanceCheck, CredentialPublicKey,
    CredentialStore, ParsedClientData, PasskeyError, PubKeyCredParam,
    PublicKeyCredentialUserEntity, RegisterCredential, RegistrationOptions, RegistrationStatus,
    RelyingParty, RpConfig, TokenBinding, UserRecord, finish_authentication, finish_registration,
    start_authentication, start_registration,
};

pub use utils::UtilError;
