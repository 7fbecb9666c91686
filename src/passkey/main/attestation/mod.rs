mod core;
mod u2f;

pub(crate) use core::{extract_aaguid, verify_attestation};
