//! Built-in key store implementations

#[cfg(feature = "file-store")]
mod file_store;
#[cfg(feature = "keychain-store")]
mod keychain_service;
#[cfg(feature = "keychain-store")]
mod keychain_store;
mod memory_store;

#[cfg(feature = "file-store")]
pub use file_store::{FileKeyStore, FileKeyStoreBuilder};
#[cfg(feature = "keychain-store")]
pub use keychain_store::KeychainStore;
pub use memory_store::MemoryKeyStore;
