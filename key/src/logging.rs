//! Logging setup and log-safe rendering of identifiers
//!
//! The crate logs through the `log` facade. Binaries and tests pick the
//! backend; [`init`] installs `env_logger` configured from `RUST_LOG`:
//! - `RUST_LOG=rsa_keyring=debug` - lifecycle detail
//! - `RUST_LOG=info` - generation, restore and deletion events only

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize `env_logger` once per process
pub fn init() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::from_default_env()
            .format_timestamp_micros()
            .init();

        info!("Structured logging initialized");
    });
}

/// Initialize logging for tests; safe to call from every test
pub fn init_test() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}

/// Short SHA-256 tag standing in for an identifier in log output
///
/// Returns `#` followed by the first 12 hex characters of the digest.
#[must_use]
pub fn redact_identifier(identifier: &str) -> String {
    let digest = hex::encode(Sha256::digest(identifier.as_bytes()));
    format!("#{}", &digest[..12])
}

/// Log a key lifecycle event against a redacted identity
pub(crate) fn log_lifecycle(event: &str, identity: &dyn std::fmt::Display, success: bool) {
    if success {
        info!("Key lifecycle: {event} succeeded ({identity})");
    } else {
        warn!("Key lifecycle: {event} failed ({identity})");
    }
}

/// Log how long a lifecycle step took
pub(crate) fn log_duration(operation: &str, elapsed: Duration) {
    debug!("Performance: {operation} completed in {}ms", elapsed.as_millis());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_is_stable_and_distinct() {
        init_test();

        let first = redact_identifier("com.rsa.KeyPair.PublicKey");
        let again = redact_identifier("com.rsa.KeyPair.PublicKey");
        let other = redact_identifier("com.rsa.KeyPair.PrivateKey");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(first.starts_with('#'));
        assert_eq!(first.len(), 13);
    }

    #[test]
    fn test_logging_helpers_do_not_panic() {
        init_test();
        init_test();

        log_lifecycle("generate", &"pub=#0 priv=#1", true);
        log_lifecycle("delete", &"pub=#0 priv=#1", false);
        log_duration("generate", Duration::from_millis(12));
    }
}
