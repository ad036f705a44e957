//! OS keychain key storage (macOS Keychain, Windows Credential Manager,
//! Linux Secret Service)

use super::keychain_service::KeychainService;
use crate::{
    store_results::{DeleteResult, ExistsResult, FetchResult, PendingResult, StoreResult},
    traits::KeyStorage,
};
use zeroize::Zeroizing;

/// OS keychain store; each identifier is an account under one service name
#[derive(Clone)]
pub struct KeychainStore {
    service_name: String,
    service: KeychainService,
}

impl KeychainStore {
    /// Create a keychain store scoped to `service_name`
    pub fn for_app(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service: KeychainService::new(),
        }
    }

    /// Service name entries are filed under
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl std::fmt::Debug for KeychainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainStore")
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

impl KeyStorage for KeychainStore {
    fn store(&self, identifier: &str, key_material: &[u8]) -> StoreResult {
        let service = self.service.clone();
        let service_name = self.service_name.clone();
        let account = identifier.to_string();
        let data = Zeroizing::new(key_material.to_vec());

        PendingResult::spawn("store", async move {
            service.store(service_name, account, data).await
        })
    }

    fn fetch(&self, identifier: &str) -> FetchResult {
        let service = self.service.clone();
        let service_name = self.service_name.clone();
        let account = identifier.to_string();

        PendingResult::spawn("fetch", async move { service.fetch(service_name, account).await })
    }

    fn delete(&self, identifier: &str) -> DeleteResult {
        let service = self.service.clone();
        let service_name = self.service_name.clone();
        let account = identifier.to_string();

        PendingResult::spawn("delete", async move {
            service.delete(service_name, account).await
        })
    }

    fn exists(&self, identifier: &str) -> ExistsResult {
        let service = self.service.clone();
        let service_name = self.service_name.clone();
        let account = identifier.to_string();

        PendingResult::spawn("exists", async move {
            service.exists(service_name, account).await
        })
    }

    fn backend_name(&self) -> &'static str {
        "keychain"
    }
}
