mod config;
mod errors;
mod main;
mod storage;
mod types;

pub use config::RpConfig;
pub use errors::{ConformanceCheck, PasskeyError};

pub use main::{
    AllowCredential, AttestationObject, AttestedCredentialData, AuthenticationOptions,
    AuthenticationStatus, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorData, ParsedClientData, PubKeyCredParam, PublicKeyCredentialUserEntity,
    RegisterCredential, RegistrationOptions, RegistrationStatus, RelyingParty, TokenBinding,
    finish_authentication, finish_registration, start_authentication, start_registration,
};

pub use storage::{ChallengeLedger, CredentialStore};
pub use types::{AuthenticatorRecord, CredentialPublicKey, UserRecord};
