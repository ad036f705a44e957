//! Manager configuration

use crate::{KeyError, Result, key_id::KeyIdentity, key_size::KeySize};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifier the public half is stored under unless configured otherwise
pub const DEFAULT_PUBLIC_IDENTIFIER: &str = "com.rsa.KeyPair.PublicKey";
/// Identifier the private half is stored under unless configured otherwise
pub const DEFAULT_PRIVATE_IDENTIFIER: &str = "com.rsa.KeyPair.PrivateKey";
/// Default bound on one key generation, in seconds
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
/// Default bound on one store call, in seconds
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

/// Settings for the key manager and its stores
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaConfig {
    /// Modulus size for newly generated pairs
    #[serde(default)]
    pub key_size: KeySize,
    /// Store identifier of the public half
    #[serde(default = "default_public_identifier")]
    pub public_identifier: String,
    /// Store identifier of the private half
    #[serde(default = "default_private_identifier")]
    pub private_identifier: String,
    /// Keychain service name entries are filed under
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Upper bound on a single key generation, in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,
    /// Upper bound on a single store call, in seconds (keychains may prompt)
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
    /// Directory for the file store
    #[serde(default = "default_key_directory")]
    pub key_directory: PathBuf,
}

fn default_public_identifier() -> String {
    DEFAULT_PUBLIC_IDENTIFIER.to_string()
}

fn default_private_identifier() -> String {
    DEFAULT_PRIVATE_IDENTIFIER.to_string()
}

fn default_service_name() -> String {
    "rsa_keyring".to_string()
}

fn default_generation_timeout() -> u64 {
    DEFAULT_GENERATION_TIMEOUT_SECS
}

fn default_store_timeout() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

fn default_key_directory() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("rsa_keyring").join("keys"),
        None => {
            log::warn!("Could not determine OS data directory, using ./rsa_keyring/keys");
            PathBuf::from("./rsa_keyring/keys")
        }
    }
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            key_size: KeySize::default(),
            public_identifier: default_public_identifier(),
            private_identifier: default_private_identifier(),
            service_name: default_service_name(),
            generation_timeout_secs: default_generation_timeout(),
            store_timeout_secs: default_store_timeout(),
            key_directory: default_key_directory(),
        }
    }
}

impl RsaConfig {
    /// Parse a configuration from JSON text; missing fields take defaults
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Config` on malformed JSON or an unsupported key size.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| KeyError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Io` if the file cannot be read, otherwise as
    /// [`RsaConfig::from_json`].
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&text)
    }

    /// Check the values serde cannot
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Config` for zero timeouts or an empty service name,
    /// and `KeyError::InvalidInput` for bad identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.generation_timeout_secs == 0 || self.store_timeout_secs == 0 {
            return Err(KeyError::Config("timeouts must be non-zero".into()));
        }
        if self.service_name.trim().is_empty() {
            return Err(KeyError::Config("service_name must not be empty".into()));
        }
        self.identity().map(|_| ())
    }

    /// Identity built from the configured identifiers and size
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if the identifiers are unusable.
    pub fn identity(&self) -> Result<KeyIdentity> {
        KeyIdentity::new(
            self.public_identifier.clone(),
            self.private_identifier.clone(),
            self.key_size,
        )
    }

    /// Generation timeout as a `Duration`
    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Store timeout as a `Duration`
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RsaConfig::default();
        assert_eq!(config.key_size, KeySize::Bits2048);
        assert_eq!(config.public_identifier, DEFAULT_PUBLIC_IDENTIFIER);
        assert_eq!(config.private_identifier, DEFAULT_PRIVATE_IDENTIFIER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            RsaConfig::from_json(r#"{ "key_size": 1024, "public_identifier": "app.pub" }"#)
                .unwrap();
        assert_eq!(config.key_size, KeySize::Bits1024);
        assert_eq!(config.public_identifier, "app.pub");
        assert_eq!(config.private_identifier, DEFAULT_PRIVATE_IDENTIFIER);
        assert_eq!(config.store_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            RsaConfig::from_json(r#"{ "key_size": 4096 }"#),
            Err(KeyError::Config(_))
        ));
        assert!(matches!(
            RsaConfig::from_json(r#"{ "store_timeout_secs": 0 }"#),
            Err(KeyError::Config(_))
        ));
        assert!(matches!(
            RsaConfig::from_json(r#"{ "private_identifier": "" }"#),
            Err(KeyError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsa.json");
        std::fs::write(&path, r#"{ "service_name": "my-app" }"#).unwrap();

        let config = RsaConfig::from_file(&path).await.unwrap();
        assert_eq!(config.service_name, "my-app");
        assert!(RsaConfig::from_file(dir.path().join("missing.json")).await.is_err());
    }
}
