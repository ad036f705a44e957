//! AES-GCM protection of key material at rest

use crate::{KeyError, Result};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypt key material; the identifier is bound in as associated data
pub(super) fn encrypt_key_material(
    key_material: &[u8],
    identifier: &str,
    master_key: &[u8; 32],
) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(master_key)
        .map_err(|e| KeyError::InvalidInput(format!("Invalid master key: {e}")))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: key_material,
                aad: identifier.as_bytes(),
            },
        )
        .map_err(|_| KeyError::KeyStorage("Key material encryption failed".into()))?;

    let mut encrypted = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    encrypted.extend_from_slice(&nonce);
    encrypted.extend_from_slice(&ciphertext);
    Ok(encrypted)
}

/// Decrypt key material written by [`encrypt_key_material`]
pub(super) fn decrypt_key_material(
    encrypted: &[u8],
    identifier: &str,
    master_key: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>> {
    if encrypted.len() < NONCE_LEN + TAG_LEN {
        return Err(KeyError::InvalidKeyFormat(
            "Encrypted key file is truncated".into(),
        ));
    }

    let (nonce, ciphertext) = encrypted.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(master_key)
        .map_err(|e| KeyError::InvalidInput(format!("Invalid master key: {e}")))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: identifier.as_bytes(),
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| {
            KeyError::KeyStorage("Key file could not be decrypted with this master key".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_identifier_does_not_decrypt() {
        let master = [7u8; 32];
        let sealed = encrypt_key_material(b"der bytes", "app.priv", &master).unwrap();

        let opened = decrypt_key_material(&sealed, "app.priv", &master).unwrap();
        assert_eq!(opened.as_slice(), b"der bytes");
        assert!(decrypt_key_material(&sealed, "app.pub", &master).is_err());
        assert!(decrypt_key_material(&sealed, "app.priv", &[8u8; 32]).is_err());
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert!(matches!(
            decrypt_key_material(&[0u8; 20], "id", &[0u8; 32]),
            Err(KeyError::InvalidKeyFormat(_))
        ));
    }
}
