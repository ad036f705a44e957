//! # RSA Keyring
//!
//! RSA key pairs kept in a pluggable key store, with the crypto operations
//! bound to whichever pair is active.
//!
//! ## Features
//!
//! - **Generate or restore**: a pair is created only when none is stored
//! - **Identifier-scoped storage**: each half lives under its own identifier
//! - **Crypto operations**: PKCS#1 v1.5 encrypt/decrypt, RSASSA-PKCS1-v1_5
//!   SHA-256 sign/verify
//! - **Export**: native PKCS#1 and X.509 SPKI Base64, PEM, `strip_pem`
//! - **Stores**: in-memory, AES-GCM encrypted files, OS keychain
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rsa_keyring::{KeySize, RsaKeyManager, store::MemoryKeyStore};
//!
//! # #[tokio::main]
//! # async fn main() -> rsa_keyring::Result<()> {
//! let manager = RsaKeyManager::new(MemoryKeyStore::new());
//! manager.set_identifiers("app.pub", "app.priv")?;
//! manager.set_key_size(KeySize::Bits1024);
//! manager.generate_if_needed().await?;
//!
//! let ciphertext = manager.encrypt("hello")?;
//! assert_eq!(manager.decrypt(&ciphertext)?, "hello");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod encryption_manager;
pub mod error;
pub mod generate_result;
pub mod key_id;
pub mod key_pair;
pub mod key_size;
pub mod logging;
pub mod manager;
pub mod pem;
pub mod primitive;
pub mod store;
pub mod store_results;
pub mod traits;

// Re-export core types
pub use config::RsaConfig;
pub use encryption_manager::EncryptionManager;
pub use error::{KeyError, Result};
pub use generate_result::{GenerateOutcome, GenerateResult};
pub use key_id::KeyIdentity;
pub use key_pair::RsaKeyPair;
pub use key_size::KeySize;
pub use manager::{KeyState, RsaKeyManager};
pub use pem::strip_pem;
pub use primitive::{RsaPrimitive, SoftwareRsa};
pub use store::MemoryKeyStore;
pub use store_results::{PendingResult, PendingResultWithHandler};
pub use traits::KeyStorage;

#[cfg(feature = "file-store")]
pub use store::FileKeyStore;
#[cfg(feature = "keychain-store")]
pub use store::KeychainStore;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EncryptionManager, GenerateOutcome, KeyError, KeySize, KeyState, KeyStorage,
        MemoryKeyStore, Result, RsaConfig, RsaKeyManager, strip_pem,
    };

    #[cfg(feature = "file-store")]
    pub use crate::FileKeyStore;
    #[cfg(feature = "keychain-store")]
    pub use crate::KeychainStore;
}
