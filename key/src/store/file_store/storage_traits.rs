//! `KeyStorage` implementation for file-based storage

use super::core::FileKeyStore;
use super::encryption::{decrypt_key_material, encrypt_key_material};
use crate::{
    KeyError, Result,
    logging::redact_identifier,
    store_results::{DeleteResult, ExistsResult, FetchResult, PendingResult, StoreResult},
    traits::KeyStorage,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use zeroize::Zeroizing;

impl KeyStorage for FileKeyStore {
    fn store(&self, identifier: &str, key_material: &[u8]) -> StoreResult {
        let path = self.key_path(identifier);
        match encrypt_key_material(key_material, identifier, &self.master_key) {
            Ok(sealed) => PendingResult::spawn(
                "store",
                write_key_file(path, sealed, redact_identifier(identifier)),
            ),
            Err(e) => PendingResult::ready("store", Err(e)),
        }
    }

    fn fetch(&self, identifier: &str) -> FetchResult {
        let path = self.key_path(identifier);
        let master_key = Arc::clone(&self.master_key);
        let identifier = identifier.to_string();
        PendingResult::spawn("fetch", read_key_file(path, identifier, master_key))
    }

    fn delete(&self, identifier: &str) -> DeleteResult {
        PendingResult::spawn(
            "delete",
            remove_key_file(self.key_path(identifier), redact_identifier(identifier)),
        )
    }

    fn exists(&self, identifier: &str) -> ExistsResult {
        PendingResult::spawn("exists", key_file_exists(self.key_path(identifier)))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

async fn write_key_file(path: PathBuf, sealed: Vec<u8>, tag: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !fs::try_exists(parent).await? {
            fs::create_dir_all(parent).await?;
            // Only directories created here are tightened
            restrict_permissions(parent, 0o700, &tag);
        }
    }

    // Write to a temp file first so a crash never leaves half a key; the
    // random suffix keeps concurrent writers off each other's temp file
    let temp_path = path.with_extension(format!("tmp.{:016x}", rand::random::<u64>()));
    let written = match fs::write(&temp_path, &sealed).await {
        Ok(()) => fs::rename(&temp_path, &path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path).await;
        log::warn!("Writing key file for {tag} failed: {e}");
        return Err(KeyError::Io(e));
    }
    restrict_permissions(&path, 0o600, &tag);

    log::debug!("Stored key file for {tag}");
    Ok(())
}

async fn read_key_file(
    path: PathBuf,
    identifier: String,
    master_key: Arc<Zeroizing<[u8; 32]>>,
) -> Result<Option<Zeroizing<Vec<u8>>>> {
    match fs::read(&path).await {
        Ok(sealed) => decrypt_key_material(&sealed, &identifier, &master_key).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KeyError::Io(e)),
    }
}

async fn remove_key_file(path: PathBuf, tag: String) -> Result<()> {
    match fs::remove_file(&path).await {
        Ok(()) => {
            log::debug!("Removed key file for {tag}");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(KeyError::Io(e)),
    }
}

async fn key_file_exists(path: PathBuf) -> Result<bool> {
    Ok(fs::try_exists(&path).await?)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32, tag: &str) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
        log::warn!("Failed to set permissions {mode:o} for {tag}: {e}");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32, _tag: &str) {}
