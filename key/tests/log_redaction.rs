//! Log output from a file-backed lifecycle never names the identifiers
#![cfg(feature = "file-store")]

use log::{Level, LevelFilter, Log, Metadata, Record};
use rsa_keyring::prelude::*;
use std::sync::Mutex;

/// Records every formatted line
struct CapturingLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record<'_>) {
        let line = format!("{} {} {}", record.level(), record.target(), record.args());
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

#[tokio::test]
async fn test_file_store_lifecycle_logs_no_identifiers() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::at(dir.path().join("keys")).with_master_key([0x42; 32]);
    let manager = RsaKeyManager::new(store);
    manager
        .set_identifiers("user.alice.secret.pub", "user.alice.secret.priv")
        .unwrap();
    manager.set_key_size(KeySize::Bits512);

    manager.generate_if_needed().await.unwrap();
    let reopened =
        RsaKeyManager::new(FileKeyStore::at(dir.path().join("keys")).with_master_key([0x42; 32]));
    reopened
        .set_identifiers("user.alice.secret.pub", "user.alice.secret.priv")
        .unwrap();
    assert!(reopened.restore_if_exists().await.unwrap());
    manager.delete_key_pair().await.unwrap();

    let lines = LOGGER.lines.lock().unwrap();
    assert!(lines.iter().any(|line| line.contains("Stored key file")));
    assert!(lines.iter().any(|line| line.contains("Removed key file")));
    for line in lines.iter() {
        assert!(!line.contains("alice"), "identifier leaked: {line}");
        assert!(!line.contains(&dir.path().display().to_string()), "path leaked: {line}");
    }
}
