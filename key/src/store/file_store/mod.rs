//! File-based key storage
//!
//! One AES-256-GCM encrypted file per identifier, written atomically.

mod core;
mod encryption;
mod storage_traits;

pub use self::core::{FileKeyStore, FileKeyStoreBuilder};
