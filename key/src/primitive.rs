//! RSA primitive provider
//!
//! The manager never does RSA math itself; it calls an [`RsaPrimitive`].
//! [`SoftwareRsa`] is the RustCrypto-backed implementation: PKCS#1 v1.5
//! padding for encryption and RSASSA-PKCS1-v1_5 with SHA-256 for signatures.

use crate::{KeyError, Result, key_pair::RsaKeyPair, key_size::KeySize};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::rand_core::OsRng;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

/// Raw RSA operations given key material
pub trait RsaPrimitive: Send + Sync + 'static {
    /// Generate a fresh key pair of the given size
    ///
    /// # Errors
    ///
    /// Returns `KeyError::GenerationFailed` if the primitive cannot produce a pair.
    fn generate_key_pair(&self, size: KeySize) -> Result<RsaKeyPair>;

    /// Encrypt a plaintext block with the public key
    ///
    /// # Errors
    ///
    /// Returns `KeyError::EncryptionFailed` if the primitive rejects the input.
    fn encrypt(&self, public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a ciphertext block with the private key
    ///
    /// # Errors
    ///
    /// Returns `KeyError::DecryptionFailed` on wrong key, corruption or bad padding.
    fn decrypt(&self, private_key: &RsaPrivateKey, ciphertext: &[u8])
    -> Result<Zeroizing<Vec<u8>>>;

    /// Sign a message with the private key
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Internal` if the signing operation fails.
    fn sign(&self, private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>>;

    /// Check a signature; any mismatch or malformed signature is `false`
    fn verify(&self, public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool;
}

/// RustCrypto `rsa` implementation of [`RsaPrimitive`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareRsa;

impl RsaPrimitive for SoftwareRsa {
    fn generate_key_pair(&self, size: KeySize) -> Result<RsaKeyPair> {
        let private_key = RsaPrivateKey::new(&mut OsRng, size.bits() as usize)
            .map_err(|e| KeyError::GenerationFailed(format!("RSA key generation failed: {e}")))?;
        RsaKeyPair::from_private_key(private_key)
    }

    fn encrypt(&self, public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| KeyError::EncryptionFailed(format!("RSA encryption failed: {e}")))
    }

    fn decrypt(
        &self,
        private_key: &RsaPrivateKey,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        private_key
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| KeyError::DecryptionFailed(format!("RSA decryption failed: {e}")))
    }

    fn sign(&self, private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(private_key.clone());
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| KeyError::Internal(format!("RSA signing failed: {e}")))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
        let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        verifying_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_requested_size() {
        let pair = SoftwareRsa.generate_key_pair(KeySize::Bits512).unwrap();
        assert_eq!(pair.size(), KeySize::Bits512);
    }

    #[test]
    fn test_encrypt_decrypt_block() {
        let pair = SoftwareRsa.generate_key_pair(KeySize::Bits512).unwrap();
        let ciphertext = SoftwareRsa.encrypt(pair.public_key(), b"block").unwrap();
        assert_eq!(ciphertext.len(), KeySize::Bits512.modulus_bytes());

        let plaintext = SoftwareRsa.decrypt(pair.private_key(), &ciphertext).unwrap();
        assert_eq!(plaintext.as_slice(), b"block");
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let pair = SoftwareRsa.generate_key_pair(KeySize::Bits512).unwrap();
        let other = SoftwareRsa.generate_key_pair(KeySize::Bits512).unwrap();
        let ciphertext = SoftwareRsa.encrypt(pair.public_key(), b"block").unwrap();

        assert!(matches!(
            SoftwareRsa.decrypt(other.private_key(), &ciphertext),
            Err(KeyError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_signature_is_deterministic_and_verifies() {
        let pair = SoftwareRsa.generate_key_pair(KeySize::Bits512).unwrap();
        let first = SoftwareRsa.sign(pair.private_key(), b"message").unwrap();
        let second = SoftwareRsa.sign(pair.private_key(), b"message").unwrap();

        // PKCS#1 v1.5 signatures carry no randomness
        assert_eq!(first, second);
        assert!(SoftwareRsa.verify(pair.public_key(), b"message", &first));
        assert!(!SoftwareRsa.verify(pair.public_key(), b"messagE", &first));
        assert!(!SoftwareRsa.verify(pair.public_key(), b"message", &first[1..]));
    }
}
