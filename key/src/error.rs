//! Comprehensive error handling for the RSA key manager

use thiserror::Error;

/// Key-specific errors
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key pair has been generated or restored yet
    #[error("Key pair not available: generate or restore a key pair first")]
    KeyNotAvailable,

    /// Caller supplied input that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key size outside the supported set
    #[error("Invalid key size: {0} bits (supported: 512, 768, 1024, 2048)")]
    InvalidKeySize(u32),

    /// Encryption operation failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption operation failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key pair generation failed
    #[error("Key generation failed: {0}")]
    GenerationFailed(String),

    /// Stored or supplied key material could not be parsed
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Key storage operation failed
    #[error("Key storage error: {0}")]
    KeyStorage(String),

    /// Storage backend error occurred
    #[error("Storage backend error: {operation} failed - {details}")]
    StorageBackendError {
        /// The storage operation that failed
        operation: String,
        /// Detailed error information
        details: String,
    },

    /// Operation did not finish within its time budget
    #[error("Operation timed out: {operation} after {seconds}s")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Budget in seconds
        seconds: u64,
    },

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeyError {
    /// Create an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a storage backend error for the named operation
    pub fn backend(operation: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::StorageBackendError {
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// True if the caller should generate or restore before retrying
    #[must_use]
    pub fn is_key_not_available(&self) -> bool {
        matches!(self, Self::KeyNotAvailable)
    }
}

/// Result type for key operations
pub type Result<T> = std::result::Result<T, KeyError>;
