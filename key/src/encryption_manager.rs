//! Ready-to-use facade: one configured key pair, generated or restored up front

use crate::{
    Result,
    config::RsaConfig,
    manager::RsaKeyManager,
    primitive::SoftwareRsa,
    traits::KeyStorage,
};
use zeroize::Zeroizing;

#[cfg(feature = "file-store")]
use crate::store::FileKeyStore;
#[cfg(feature = "keychain-store")]
use crate::store::KeychainStore;

/// Key manager that is always configured and has generated or restored
/// its pair before it is handed out
#[derive(Debug, Clone)]
pub struct EncryptionManager<S: KeyStorage> {
    manager: RsaKeyManager<S, SoftwareRsa>,
}

impl<S: KeyStorage> EncryptionManager<S> {
    /// Default identifiers, 2048-bit keys
    ///
    /// # Errors
    ///
    /// Returns any error from generate-or-restore.
    pub async fn new(store: S) -> Result<Self> {
        Self::from_config(store, &RsaConfig::default()).await
    }

    /// Build from `config` and generate or restore the pair
    ///
    /// # Errors
    ///
    /// Returns configuration errors and any error from generate-or-restore.
    pub async fn from_config(store: S, config: &RsaConfig) -> Result<Self> {
        let manager = RsaKeyManager::from_config(store, SoftwareRsa, config)?;
        manager.generate_if_needed().await?;
        Ok(Self { manager })
    }

    /// SPKI public key in Base64, for servers that expect X.509 encoding
    ///
    /// Regenerates or restores first if the pair has been deleted.
    ///
    /// # Errors
    ///
    /// Returns any error from generate-or-restore or encoding.
    pub async fn public_key_for_interop_server(&self) -> Result<String> {
        if !self.manager.is_present() {
            self.manager.generate_if_needed().await?;
        }
        self.manager.public_key_base64_for_interop_server()
    }

    /// Native PKCS#1 public key in Base64
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` if the pair has been deleted.
    pub fn public_key_from_store(&self) -> Result<String> {
        self.manager.public_key_base64()
    }

    /// PKCS#1 private key in Base64
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` if the pair has been deleted.
    pub fn private_key_from_store(&self) -> Result<Zeroizing<String>> {
        self.manager.private_key_base64()
    }

    /// Underlying key manager for crypto and lifecycle calls
    #[must_use]
    pub fn manager(&self) -> &RsaKeyManager<S, SoftwareRsa> {
        &self.manager
    }
}

#[cfg(feature = "keychain-store")]
impl EncryptionManager<KeychainStore> {
    /// Keep the pair in the OS keychain under `config.service_name`
    ///
    /// # Errors
    ///
    /// As [`EncryptionManager::from_config`].
    pub async fn with_keychain(config: &RsaConfig) -> Result<Self> {
        Self::from_config(KeychainStore::for_app(config.service_name.clone()), config).await
    }
}

#[cfg(feature = "file-store")]
impl EncryptionManager<FileKeyStore> {
    /// Keep the pair in encrypted files under `config.key_directory`
    ///
    /// # Errors
    ///
    /// As [`EncryptionManager::from_config`].
    pub async fn with_file_store(config: &RsaConfig, master_key: [u8; 32]) -> Result<Self> {
        let store = FileKeyStore::at(&config.key_directory).with_master_key(master_key);
        Self::from_config(store, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_size::KeySize;
    use crate::logging::init_test;
    use crate::store::MemoryKeyStore;
    use base64::{Engine, engine::general_purpose::STANDARD};

    fn small_config() -> RsaConfig {
        RsaConfig {
            key_size: KeySize::Bits512,
            ..RsaConfig::default()
        }
    }

    #[tokio::test]
    async fn test_interop_key_is_spki() {
        init_test();
        let encryption = EncryptionManager::from_config(MemoryKeyStore::new(), &small_config())
            .await
            .unwrap();

        let interop = STANDARD
            .decode(encryption.public_key_for_interop_server().await.unwrap())
            .unwrap();
        let native = STANDARD
            .decode(encryption.public_key_from_store().unwrap())
            .unwrap();

        // SPKI wraps the PKCS#1 key in an algorithm header
        assert!(interop.len() > native.len());
        assert!(interop.ends_with(&native));
        assert!(!encryption.private_key_from_store().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_interop_key_regenerates_after_delete() {
        init_test();
        let encryption = EncryptionManager::from_config(MemoryKeyStore::new(), &small_config())
            .await
            .unwrap();

        encryption.manager().delete_key_pair().await.unwrap();
        assert!(encryption.public_key_from_store().is_err());

        assert!(encryption.public_key_for_interop_server().await.is_ok());
        assert!(encryption.public_key_from_store().is_ok());
    }

    #[tokio::test]
    async fn test_second_facade_restores_same_pair() {
        init_test();
        let store = MemoryKeyStore::new();
        let first = EncryptionManager::from_config(store.clone(), &small_config())
            .await
            .unwrap();
        let second = EncryptionManager::from_config(store, &small_config())
            .await
            .unwrap();

        assert_eq!(
            first.public_key_from_store().unwrap(),
            second.public_key_from_store().unwrap()
        );
    }

    #[cfg(feature = "file-store")]
    #[tokio::test]
    async fn test_file_backed_facade() {
        init_test();
        let dir = tempfile::tempdir().unwrap();
        let config = RsaConfig {
            key_directory: dir.path().to_path_buf(),
            ..small_config()
        };

        let encryption = EncryptionManager::with_file_store(&config, [7u8; 32])
            .await
            .unwrap();
        let reopened = EncryptionManager::with_file_store(&config, [7u8; 32])
            .await
            .unwrap();
        assert_eq!(
            encryption.public_key_from_store().unwrap(),
            reopened.public_key_from_store().unwrap()
        );
    }
}
