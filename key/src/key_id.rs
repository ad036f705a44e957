//! Key identity: where each half of a key pair lives in the backing store

use crate::{KeyError, Result, key_size::KeySize, logging::redact_identifier};
use std::fmt;

/// Pair of store identifiers plus the modulus size used when generating
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyIdentity {
    public_identifier: String,
    private_identifier: String,
    key_size: KeySize,
}

impl KeyIdentity {
    /// Create a key identity, rejecting empty or identical identifiers
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if either identifier is empty or
    /// whitespace, or if both halves would share one store slot.
    pub fn new(
        public_identifier: impl Into<String>,
        private_identifier: impl Into<String>,
        key_size: KeySize,
    ) -> Result<Self> {
        let public_identifier = public_identifier.into();
        let private_identifier = private_identifier.into();

        validate_identifier("public", &public_identifier)?;
        validate_identifier("private", &private_identifier)?;
        if public_identifier == private_identifier {
            return Err(KeyError::invalid_input(
                "public and private identifiers must differ",
            ));
        }

        Ok(Self {
            public_identifier,
            private_identifier,
            key_size,
        })
    }

    /// Identifier of the public half
    #[must_use]
    pub fn public_identifier(&self) -> &str {
        &self.public_identifier
    }

    /// Identifier of the private half
    #[must_use]
    pub fn private_identifier(&self) -> &str {
        &self.private_identifier
    }

    /// Modulus size used for generation
    #[must_use]
    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Same identifiers, different size
    #[must_use]
    pub fn with_key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }
}

/// Identifiers never show up verbatim in logs
impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pub={} priv={} ({})",
            redact_identifier(&self.public_identifier),
            redact_identifier(&self.private_identifier),
            self.key_size
        )
    }
}

fn validate_identifier(half: &str, identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(KeyError::InvalidInput(format!(
            "{half} key identifier must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identity() {
        let identity = KeyIdentity::new("app.pub", "app.priv", KeySize::Bits1024).unwrap();
        assert_eq!(identity.public_identifier(), "app.pub");
        assert_eq!(identity.private_identifier(), "app.priv");
        assert_eq!(identity.key_size(), KeySize::Bits1024);
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        assert!(matches!(
            KeyIdentity::new("", "app.priv", KeySize::default()),
            Err(KeyError::InvalidInput(_))
        ));
        assert!(matches!(
            KeyIdentity::new("app.pub", "   ", KeySize::default()),
            Err(KeyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_shared_identifier_rejected() {
        assert!(KeyIdentity::new("same", "same", KeySize::default()).is_err());
    }

    #[test]
    fn test_display_hides_identifiers() {
        let identity = KeyIdentity::new("secret.pub", "secret.priv", KeySize::Bits512).unwrap();
        let shown = identity.to_string();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("512-bit"));
    }
}
