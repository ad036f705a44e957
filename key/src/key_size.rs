//! Closed set of supported RSA modulus sizes

use crate::KeyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes of PKCS#1 v1.5 encryption padding overhead
pub const PKCS1_V15_OVERHEAD: usize = 11;

/// Supported RSA modulus sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    /// 512-bit modulus
    Bits512,
    /// 768-bit modulus
    Bits768,
    /// 1024-bit modulus
    Bits1024,
    /// 2048-bit modulus
    #[default]
    Bits2048,
}

impl KeySize {
    /// All supported sizes, smallest first
    pub const ALL: [KeySize; 4] = [
        KeySize::Bits512,
        KeySize::Bits768,
        KeySize::Bits1024,
        KeySize::Bits2048,
    ];

    /// Modulus size in bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            KeySize::Bits512 => 512,
            KeySize::Bits768 => 768,
            KeySize::Bits1024 => 1024,
            KeySize::Bits2048 => 2048,
        }
    }

    /// Modulus size in bytes (also the ciphertext and signature length)
    #[must_use]
    pub const fn modulus_bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Largest plaintext accepted by PKCS#1 v1.5 encryption
    #[must_use]
    pub const fn max_plaintext_len(self) -> usize {
        self.modulus_bytes() - PKCS1_V15_OVERHEAD
    }
}

impl TryFrom<u32> for KeySize {
    type Error = KeyError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            512 => Ok(KeySize::Bits512),
            768 => Ok(KeySize::Bits768),
            1024 => Ok(KeySize::Bits1024),
            2048 => Ok(KeySize::Bits2048),
            other => Err(KeyError::InvalidKeySize(other)),
        }
    }
}

impl TryFrom<usize> for KeySize {
    type Error = KeyError;

    fn try_from(bits: usize) -> Result<Self, Self::Error> {
        let bits = u32::try_from(bits).unwrap_or(u32::MAX);
        KeySize::try_from(bits)
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> Self {
        size.bits()
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sizes_round_trip() {
        for size in KeySize::ALL {
            assert_eq!(KeySize::try_from(size.bits()).unwrap(), size);
        }
    }

    #[test]
    fn test_unsupported_size_rejected() {
        assert!(matches!(
            KeySize::try_from(4096u32),
            Err(KeyError::InvalidKeySize(4096))
        ));
        assert!(KeySize::try_from(0u32).is_err());
        assert!(KeySize::try_from(usize::MAX).is_err());
    }

    #[test]
    fn test_plaintext_ceiling() {
        assert_eq!(KeySize::Bits512.max_plaintext_len(), 53);
        assert_eq!(KeySize::Bits2048.max_plaintext_len(), 245);
        assert_eq!(KeySize::default(), KeySize::Bits2048);
    }

    #[test]
    fn test_serde_uses_bit_count() {
        let json = serde_json::to_string(&KeySize::Bits1024).unwrap();
        assert_eq!(json, "1024");
        let parsed: KeySize = serde_json::from_str("768").unwrap();
        assert_eq!(parsed, KeySize::Bits768);
        assert!(serde_json::from_str::<KeySize>("1000").is_err());
    }
}
