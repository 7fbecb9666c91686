mod attestation;
mod auth;
mod checks;
mod cose;
mod register;
mod types;

pub use auth::{finish_authentication, start_authentication};
pub use register::{finish_registration, start_registration};

pub use types::{
    AllowCredential, AttestationObject, AttestedCredentialData, AuthenticationOptions,
    AuthenticationStatus, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorData, ParsedClientData, PubKeyCredParam, PublicKeyCredentialUserEntity,
    RegisterCredential, RegistrationOptions, RegistrationStatus, RelyingParty, TokenBinding,
};
