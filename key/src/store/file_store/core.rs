//! Core types and builder for file-based key storage

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

/// File-based key store that encrypts material with a master key
#[derive(Clone)]
pub struct FileKeyStore {
    pub(super) base_path: PathBuf,
    pub(super) master_key: Arc<Zeroizing<[u8; 32]>>,
}

/// Builder for file-based key store
pub struct FileKeyStoreBuilder {
    base_path: PathBuf,
}

impl FileKeyStore {
    /// Start building a store rooted at `base_path`
    pub fn at<P: AsRef<Path>>(base_path: P) -> FileKeyStoreBuilder {
        FileKeyStoreBuilder {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the key files
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path for an identifier
    ///
    /// The readable prefix is sanitised; the digest suffix keeps identifiers
    /// that sanitise to the same prefix apart.
    pub(super) fn key_path(&self, identifier: &str) -> PathBuf {
        let readable: String = identifier
            .chars()
            .take(48)
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let digest = hex::encode(Sha256::digest(identifier.as_bytes()));
        self.base_path
            .join(format!("{readable}-{}.key", &digest[..16]))
    }
}

impl std::fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyStore")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl FileKeyStoreBuilder {
    /// Set the master key and build the store
    #[must_use]
    pub fn with_master_key(self, master_key: [u8; 32]) -> FileKeyStore {
        FileKeyStore {
            base_path: self.base_path,
            master_key: Arc::new(Zeroizing::new(master_key)),
        }
    }
}
