use std::env;

use ring::digest;

use super::errors::PasskeyError;

/// Relying-party configuration for ceremony verification.
///
/// Passed explicitly into every ceremony call so that tests and multiple
/// relying parties in one process stay isolated.
#[derive(Debug, Clone)]
pub struct RpConfig {
    /// Full web origin the client data must claim, e.g. "https://example.com"
    pub origin: String,
    /// Relying-party identifier; its SHA-256 hash must match rpIdHash
    pub rp_id: String,
    /// Human-readable relying-party name returned in registration options
    pub rp_name: String,
}

impl RpConfig {
    /// Build a configuration from an origin, deriving the RP id by
    /// stripping the scheme and port ("https://example.com:8443" -> "example.com").
    pub fn new(origin: impl Into<String>) -> Result<Self, PasskeyError> {
        let origin = origin.into();
        let rp_id = origin
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split(':')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PasskeyError::Config(format!("Could not extract RP ID from origin: {origin}"))
            })?;
        Ok(Self {
            origin,
            rp_name: rp_id.clone(),
            rp_id,
        })
    }

    /// Override the display name shown to the user at enrollment.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.rp_name = name.into();
        self
    }

    /// Read the configuration from the environment: `ORIGIN` (required) and
    /// `PASSKEY_RP_NAME` (defaults to the RP id).
    pub fn from_env() -> Result<Self, PasskeyError> {
        dotenvy::dotenv().ok();
        let origin = env::var("ORIGIN")
            .map_err(|_| PasskeyError::Config("ORIGIN must be set".to_string()))?;
        let config = Self::new(origin)?;
        match env::var("PASSKEY_RP_NAME") {
            Ok(name) => Ok(config.with_name(name)),
            Err(_) => Ok(config),
        }
    }

    /// SHA-256 hash of the RP id, the value authenticator data must carry.
    pub(crate) fn rp_id_hash(&self) -> Vec<u8> {
        digest::digest(&digest::SHA256, self.rp_id.as_bytes())
            .as_ref()
            .to_vec()
    }
}
