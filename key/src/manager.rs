//! RSA key manager: key lifecycle plus the crypto operations bound to it
//!
//! Lifecycle calls (`restore_if_exists`, `generate_if_needed`,
//! `delete_key_pair`) are writers and queue on one async lock. Crypto calls
//! are readers: they take a snapshot of the active pair and never wait on a
//! writer.

use crate::{
    KeyError, Result,
    config::{DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_STORE_TIMEOUT_SECS, RsaConfig},
    generate_result::{GenerateOutcome, GenerateResult},
    key_id::KeyIdentity,
    key_pair::{RsaKeyPair, decode_private_key, decode_public_key},
    key_size::KeySize,
    logging::{log_duration, log_lifecycle},
    pem::strip_pem,
    primitive::{RsaPrimitive, SoftwareRsa},
    store_results::PendingResult,
    traits::KeyStorage,
};
use arc_swap::{ArcSwap, ArcSwapOption};
use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Where the manager is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No identifiers have been set
    Unconfigured,
    /// Identifiers set, no pair loaded
    Absent,
    /// A pair is loaded and crypto operations are available
    Present,
}

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    generation: Duration,
    store: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            generation: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            store: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Settings {
    identity: Option<KeyIdentity>,
    key_size: KeySize,
}

struct Inner<S, P> {
    store: S,
    primitive: P,
    settings: ArcSwap<Settings>,
    active: ArcSwapOption<RsaKeyPair>,
    lifecycle: Mutex<()>,
    timeouts: Timeouts,
}

/// Handle to an RSA key pair held in a [`KeyStorage`] backend
///
/// Clones share the same state.
pub struct RsaKeyManager<S, P = SoftwareRsa> {
    inner: Arc<Inner<S, P>>,
}

impl<S, P> Clone for RsaKeyManager<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyStorage, P> fmt::Debug for RsaKeyManager<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.inner.settings.load();
        f.debug_struct("RsaKeyManager")
            .field("backend", &self.inner.store.backend_name())
            .field("identity", &settings.identity.as_ref().map(ToString::to_string))
            .field("key_size", &settings.key_size)
            .field("present", &self.inner.active.load().is_some())
            .finish()
    }
}

impl<S: KeyStorage> RsaKeyManager<S, SoftwareRsa> {
    /// Create an unconfigured manager over `store`
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_primitive(store, SoftwareRsa)
    }
}

impl<S: KeyStorage, P: RsaPrimitive> RsaKeyManager<S, P> {
    /// Create an unconfigured manager with a custom RSA primitive
    #[must_use]
    pub fn with_primitive(store: S, primitive: P) -> Self {
        Self::build(store, primitive, Settings::default(), Timeouts::default())
    }

    /// Create a manager configured from `config`
    ///
    /// # Errors
    ///
    /// Returns the error from [`RsaConfig::validate`].
    pub fn from_config(store: S, primitive: P, config: &RsaConfig) -> Result<Self> {
        config.validate()?;
        let settings = Settings {
            identity: Some(config.identity()?),
            key_size: config.key_size,
        };
        let timeouts = Timeouts {
            generation: config.generation_timeout(),
            store: config.store_timeout(),
        };
        Ok(Self::build(store, primitive, settings, timeouts))
    }

    fn build(store: S, primitive: P, settings: Settings, timeouts: Timeouts) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                primitive,
                settings: ArcSwap::from_pointee(settings),
                active: ArcSwapOption::empty(),
                lifecycle: Mutex::new(()),
                timeouts,
            }),
        }
    }

    /// Record where the public and private halves are stored
    ///
    /// A pair already loaded stays active; the next restore or generation
    /// uses the new identifiers.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` for empty or identical identifiers.
    pub fn set_identifiers(
        &self,
        public_identifier: impl Into<String>,
        private_identifier: impl Into<String>,
    ) -> Result<()> {
        let identity = KeyIdentity::new(
            public_identifier,
            private_identifier,
            self.inner.settings.load().key_size,
        )?;
        self.inner.settings.rcu(|current| Settings {
            identity: Some(identity.clone().with_key_size(current.key_size)),
            key_size: current.key_size,
        });
        debug!("Identifiers configured: {identity}");
        Ok(())
    }

    /// Record the modulus size for the next generation
    ///
    /// Changing the size never regenerates an existing pair.
    pub fn set_key_size(&self, key_size: KeySize) {
        self.inner.settings.rcu(|current| Settings {
            identity: current
                .identity
                .clone()
                .map(|identity| identity.with_key_size(key_size)),
            key_size,
        });
    }

    /// Record the modulus size given in bits
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidKeySize` unless `bits` is 512, 768, 1024 or 2048.
    pub fn set_key_size_bits(&self, bits: u32) -> Result<()> {
        self.set_key_size(KeySize::try_from(bits)?);
        Ok(())
    }

    /// Currently configured identity, if any
    #[must_use]
    pub fn identity(&self) -> Option<KeyIdentity> {
        self.inner.settings.load().identity.clone()
    }

    /// Modulus size used for the next generation
    #[must_use]
    pub fn key_size(&self) -> KeySize {
        self.inner.settings.load().key_size
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> KeyState {
        if self.inner.active.load().is_some() {
            KeyState::Present
        } else if self.inner.settings.load().identity.is_none() {
            KeyState::Unconfigured
        } else {
            KeyState::Absent
        }
    }

    /// True once a pair has been generated or restored
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.state() == KeyState::Present
    }

    /// Load the stored pair for the current identifiers
    ///
    /// Returns `Ok(false)` when no private key is stored; never generates.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if identifiers are not configured,
    /// `KeyError::InvalidKeyFormat` if stored material is corrupt or the
    /// halves do not match, and store errors as reported by the backend.
    pub async fn restore_if_exists(&self) -> Result<bool> {
        let _guard = self.inner.lifecycle.lock().await;
        let identity = self.configured_identity()?;
        let restored = self.restore_locked(&identity).await;
        log_lifecycle("restore", &identity, restored.is_ok());
        restored
    }

    /// Restore the stored pair, or generate and persist a new one
    ///
    /// Work starts immediately on the current tokio runtime; the returned
    /// result resolves once the pair is active. Called outside a runtime it
    /// resolves to `KeyError::Internal` and the store is left untouched.
    pub fn generate_if_needed(&self) -> GenerateResult {
        let manager = self.clone();
        PendingResult::spawn("generate", async move { manager.generate_or_restore().await })
    }

    /// Remove both halves from the store and clear the active pair
    ///
    /// Deleting an absent pair succeeds.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if identifiers are not configured and
    /// store errors as reported by the backend. The active pair is kept when
    /// the store refuses the deletion.
    pub async fn delete_key_pair(&self) -> Result<()> {
        let _guard = self.inner.lifecycle.lock().await;
        let identity = self.configured_identity()?;

        let private_deleted = self
            .bounded("delete", self.inner.store.delete(identity.private_identifier()))
            .await;
        let public_deleted = self
            .bounded("delete", self.inner.store.delete(identity.public_identifier()))
            .await;

        let outcome = private_deleted.and(public_deleted);
        if outcome.is_ok() {
            self.inner.active.store(None);
        }
        log_lifecycle("delete", &identity, outcome.is_ok());
        outcome
    }

    /// Encrypt `plaintext` with the public key, returning Base64 ciphertext
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair,
    /// `KeyError::InvalidInput` if the plaintext exceeds the padding ceiling
    /// for the key size, and `KeyError::EncryptionFailed` from the primitive.
    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>) -> Result<String> {
        let plaintext = plaintext.as_ref();
        let pair = self.active_pair()?;
        let ceiling = pair.size().max_plaintext_len();
        if plaintext.len() > ceiling {
            return Err(KeyError::InvalidInput(format!(
                "plaintext is {} bytes; a {} key encrypts at most {ceiling}",
                plaintext.len(),
                pair.size()
            )));
        }
        let ciphertext = self.inner.primitive.encrypt(pair.public_key(), plaintext)?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt Base64 ciphertext text into a UTF-8 string
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair and
    /// `KeyError::DecryptionFailed` for malformed Base64, wrong key, bad
    /// padding or non-UTF-8 plaintext.
    pub fn decrypt(&self, ciphertext: impl AsRef<[u8]>) -> Result<String> {
        let plaintext = self.decrypt_bytes(ciphertext)?;
        String::from_utf8(plaintext.to_vec())
            .map_err(|_| KeyError::DecryptionFailed("plaintext is not valid UTF-8".into()))
    }

    /// Decrypt Base64 ciphertext text into raw bytes
    ///
    /// # Errors
    ///
    /// As [`RsaKeyManager::decrypt`], minus the UTF-8 check.
    pub fn decrypt_bytes(&self, ciphertext: impl AsRef<[u8]>) -> Result<Zeroizing<Vec<u8>>> {
        let pair = self.active_pair()?;
        let encoded: Vec<u8> = ciphertext
            .as_ref()
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        let raw = STANDARD
            .decode(&encoded)
            .map_err(|e| KeyError::DecryptionFailed(format!("ciphertext is not Base64: {e}")))?;
        if raw.len() != pair.size().modulus_bytes() {
            return Err(KeyError::DecryptionFailed(format!(
                "ciphertext is {} bytes, expected {}",
                raw.len(),
                pair.size().modulus_bytes()
            )));
        }
        self.inner.primitive.decrypt(pair.private_key(), &raw)
    }

    /// Sign `message` with RSASSA-PKCS1-v1_5 over SHA-256
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn sign(&self, message: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let pair = self.active_pair()?;
        self.inner.primitive.sign(pair.private_key(), message.as_ref())
    }

    /// Check a signature made by [`RsaKeyManager::sign`]
    ///
    /// A mismatched or malformed signature is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn verify(&self, message: impl AsRef<[u8]>, signature: impl AsRef<[u8]>) -> Result<bool> {
        let pair = self.active_pair()?;
        Ok(self
            .inner
            .primitive
            .verify(pair.public_key(), message.as_ref(), signature.as_ref()))
    }

    /// Base64 of the public key as PKCS#1 `RSAPublicKey` DER
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn public_key_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.active_pair()?.public_key_pkcs1_der()?))
    }

    /// Base64 of the public key as X.509 SubjectPublicKeyInfo DER
    ///
    /// This is the form Java's `X509EncodedKeySpec` accepts.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn public_key_base64_for_interop_server(&self) -> Result<String> {
        Ok(STANDARD.encode(self.active_pair()?.public_key_spki_der()?))
    }

    /// Base64 of the private key as PKCS#1 `RSAPrivateKey` DER
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn private_key_base64(&self) -> Result<Zeroizing<String>> {
        let der = self.active_pair()?.private_key_pkcs1_der()?;
        Ok(Zeroizing::new(STANDARD.encode(der.as_slice())))
    }

    /// Public key as SPKI PEM
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn public_key_pem(&self) -> Result<String> {
        self.active_pair()?.public_key_spki_pem()
    }

    /// Private key as PKCS#1 PEM
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>> {
        self.active_pair()?.private_key_pem()
    }

    /// SHA-256 hex fingerprint of the active public key
    ///
    /// # Errors
    ///
    /// Returns `KeyError::KeyNotAvailable` without an active pair.
    pub fn fingerprint(&self) -> Result<String> {
        self.active_pair()?.fingerprint()
    }

    /// Remove PEM markers and whitespace from `key_string`
    #[must_use]
    pub fn strip_pem(&self, key_string: &str) -> String {
        strip_pem(key_string)
    }

    fn active_pair(&self) -> Result<Arc<RsaKeyPair>> {
        self.inner.active.load_full().ok_or(KeyError::KeyNotAvailable)
    }

    fn configured_identity(&self) -> Result<KeyIdentity> {
        self.inner
            .settings
            .load()
            .identity
            .clone()
            .ok_or_else(|| KeyError::invalid_input("key identifiers are not configured"))
    }

    async fn generate_or_restore(&self) -> Result<GenerateOutcome> {
        let _guard = self.inner.lifecycle.lock().await;
        let identity = self.configured_identity()?;

        if self.restore_locked(&identity).await? {
            log_lifecycle("restore", &identity, true);
            return Ok(GenerateOutcome::Restored);
        }

        let generated = self.generate_locked(&identity).await;
        log_lifecycle("generate", &identity, generated.is_ok());
        generated.map(|()| GenerateOutcome::Generated)
    }

    async fn restore_locked(&self, identity: &KeyIdentity) -> Result<bool> {
        let private_der = self
            .bounded("fetch", self.inner.store.fetch(identity.private_identifier()))
            .await?;
        let public_der = self
            .bounded("fetch", self.inner.store.fetch(identity.public_identifier()))
            .await?;

        let Some(private_der) = private_der else {
            if public_der.is_some() {
                warn!("Public key without private key for {identity}; treating as absent");
            }
            self.inner.active.store(None);
            return Ok(false);
        };

        let private_key = decode_private_key(&private_der)?;
        let pair = match public_der {
            Some(public_der) => RsaKeyPair::from_parts(private_key, decode_public_key(&public_der)?)?,
            None => {
                let pair = RsaKeyPair::from_private_key(private_key)?;
                info!("Public key missing for {identity}; rebuilding it from the private key");
                self.bounded(
                    "store",
                    self.inner
                        .store
                        .store(identity.public_identifier(), &pair.public_key_pkcs1_der()?),
                )
                .await?;
                pair
            }
        };

        self.activate(pair);
        Ok(true)
    }

    async fn generate_locked(&self, identity: &KeyIdentity) -> Result<()> {
        let started = Instant::now();
        let size = identity.key_size();
        let limit = self.inner.timeouts.generation;

        let inner = Arc::clone(&self.inner);
        let task = tokio::task::spawn_blocking(move || inner.primitive.generate_key_pair(size));
        let pair = match tokio::time::timeout(limit, task).await {
            Ok(Ok(generated)) => generated?,
            Ok(Err(join_error)) => {
                return Err(KeyError::GenerationFailed(format!(
                    "generation task failed: {join_error}"
                )));
            }
            Err(_) => {
                return Err(KeyError::Timeout {
                    operation: "generate".into(),
                    seconds: limit.as_secs(),
                });
            }
        };
        log_duration("generate", started.elapsed());

        let private_der = pair.private_key_pkcs1_der()?;
        let public_der = pair.public_key_pkcs1_der()?;

        self.bounded(
            "store",
            self.inner
                .store
                .store(identity.private_identifier(), &private_der),
        )
        .await
        .map_err(|e| persist_failed("private", e))?;

        if let Err(e) = self
            .bounded(
                "store",
                self.inner
                    .store
                    .store(identity.public_identifier(), &public_der),
            )
            .await
        {
            // Never leave half a pair behind
            if let Err(rollback) = self
                .bounded("delete", self.inner.store.delete(identity.private_identifier()))
                .await
            {
                error!("Rollback of private key failed for {identity}: {rollback}");
            }
            return Err(persist_failed("public", e));
        }

        self.activate(pair);
        Ok(())
    }

    fn activate(&self, pair: RsaKeyPair) {
        if let Ok(fingerprint) = pair.fingerprint() {
            debug!(
                "Active key {} via {}",
                &fingerprint[..16],
                self.inner.store.backend_name()
            );
        }
        self.inner.active.store(Some(Arc::new(pair)));
    }

    async fn bounded<T>(&self, operation: &'static str, pending: PendingResult<T>) -> Result<T> {
        let limit = self.inner.timeouts.store;
        match tokio::time::timeout(limit, pending).await {
            Ok(result) => result,
            Err(_) => Err(KeyError::Timeout {
                operation: operation.into(),
                seconds: limit.as_secs(),
            }),
        }
    }
}

fn persist_failed(half: &str, cause: KeyError) -> KeyError {
    if matches!(cause, KeyError::Timeout { .. }) {
        return cause;
    }
    KeyError::GenerationFailed(format!("persisting {half} key failed: {cause}"))
}
