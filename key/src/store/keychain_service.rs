//! Channel-based keychain worker
//!
//! `keyring` calls block (and may wait on an unlock prompt), so requests are
//! queued to one worker task that runs each call on the blocking pool.
//! Requests are served strictly in submission order.

use crate::{KeyError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, mpsc, oneshot};
use zeroize::Zeroizing;

enum KeychainRequest {
    Store {
        service: String,
        account: String,
        data: Zeroizing<Vec<u8>>,
    },
    Fetch {
        service: String,
        account: String,
    },
    Delete {
        service: String,
        account: String,
    },
    Exists {
        service: String,
        account: String,
    },
}

enum KeychainResponse {
    Stored,
    Fetched(Option<Zeroizing<Vec<u8>>>),
    Deleted,
    Exists(bool),
}

impl KeychainResponse {
    fn kind(&self) -> &'static str {
        match self {
            KeychainResponse::Stored => "stored",
            KeychainResponse::Fetched(_) => "fetched",
            KeychainResponse::Deleted => "deleted",
            KeychainResponse::Exists(_) => "exists",
        }
    }
}

type Envelope = (KeychainRequest, oneshot::Sender<Result<KeychainResponse>>);

/// Handle to the keychain worker; clones share one queue
#[derive(Clone)]
pub(super) struct KeychainService {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>>,
    started: Arc<OnceCell<()>>,
}

impl KeychainService {
    pub(super) fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
            started: Arc::new(OnceCell::new()),
        }
    }

    pub(super) async fn store(
        &self,
        service: String,
        account: String,
        data: Zeroizing<Vec<u8>>,
    ) -> Result<()> {
        match self
            .request(KeychainRequest::Store {
                service,
                account,
                data,
            })
            .await?
        {
            KeychainResponse::Stored => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub(super) async fn fetch(
        &self,
        service: String,
        account: String,
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        match self.request(KeychainRequest::Fetch { service, account }).await? {
            KeychainResponse::Fetched(data) => Ok(data),
            other => Err(unexpected(&other)),
        }
    }

    pub(super) async fn delete(&self, service: String, account: String) -> Result<()> {
        match self.request(KeychainRequest::Delete { service, account }).await? {
            KeychainResponse::Deleted => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub(super) async fn exists(&self, service: String, account: String) -> Result<bool> {
        match self.request(KeychainRequest::Exists { service, account }).await? {
            KeychainResponse::Exists(exists) => Ok(exists),
            other => Err(unexpected(&other)),
        }
    }

    async fn request(&self, request: KeychainRequest) -> Result<KeychainResponse> {
        self.ensure_worker().await;

        let (resp_tx, resp_rx) = oneshot::channel();
        self.sender
            .send((request, resp_tx))
            .map_err(|_| KeyError::internal("Keychain request channel closed"))?;

        resp_rx
            .await
            .map_err(|_| KeyError::internal("Keychain response channel closed"))?
    }

    async fn ensure_worker(&self) {
        self.started
            .get_or_init(|| async {
                let Some(mut receiver) = self.receiver.lock().await.take() else {
                    return;
                };
                tokio::spawn(async move {
                    while let Some((request, resp_tx)) = receiver.recv().await {
                        let response = tokio::task::spawn_blocking(move || perform(request))
                            .await
                            .unwrap_or_else(|e| {
                                Err(KeyError::internal(format!("Keychain worker panicked: {e}")))
                            });
                        let _ = resp_tx.send(response);
                    }
                });
                log::debug!("Keychain worker started");
            })
            .await;
    }
}

fn perform(request: KeychainRequest) -> Result<KeychainResponse> {
    match request {
        KeychainRequest::Store {
            service,
            account,
            data,
        } => perform_store(&service, &account, &data).map(|()| KeychainResponse::Stored),
        KeychainRequest::Fetch { service, account } => {
            perform_fetch(&service, &account).map(KeychainResponse::Fetched)
        }
        KeychainRequest::Delete { service, account } => {
            perform_delete(&service, &account).map(|()| KeychainResponse::Deleted)
        }
        KeychainRequest::Exists { service, account } => {
            perform_fetch(&service, &account).map(|data| KeychainResponse::Exists(data.is_some()))
        }
    }
}

fn entry(service: &str, account: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(service, account).map_err(|e| KeyError::backend("keychain open", e))
}

fn perform_store(service: &str, account: &str, data: &[u8]) -> Result<()> {
    // Keychains hold text, so material is Base64 encoded
    let encoded = Zeroizing::new(STANDARD.encode(data));
    entry(service, account)?
        .set_password(&encoded)
        .map_err(|e| KeyError::backend("keychain store", e))
}

fn perform_fetch(service: &str, account: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let encoded = match entry(service, account)?.get_password() {
        Ok(encoded) => Zeroizing::new(encoded),
        Err(keyring::Error::NoEntry) => return Ok(None),
        Err(e) => return Err(KeyError::backend("keychain fetch", e)),
    };

    STANDARD
        .decode(encoded.as_bytes())
        .map(|data| Some(Zeroizing::new(data)))
        .map_err(|e| KeyError::InvalidKeyFormat(format!("Keychain entry is not Base64: {e}")))
}

fn perform_delete(service: &str, account: &str) -> Result<()> {
    match entry(service, account)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(KeyError::backend("keychain delete", e)),
    }
}

fn unexpected(response: &KeychainResponse) -> KeyError {
    KeyError::internal(format!("Unexpected keychain response: {}", response.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_response_never_prints_material() {
        let response = KeychainResponse::Fetched(Some(Zeroizing::new(b"private der".to_vec())));
        let error = unexpected(&response).to_string();
        assert!(error.contains("fetched"));
        assert!(!error.contains("private der"));
    }

    #[tokio::test]
    async fn test_worker_starts_once_across_clones() {
        let service = KeychainService::new();
        let clone = service.clone();
        service.ensure_worker().await;
        clone.ensure_worker().await;
        assert!(service.started.initialized());
        assert!(clone.receiver.lock().await.is_none());
    }
}
