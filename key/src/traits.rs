//! Capability trait for key material backends

use crate::store_results::{DeleteResult, ExistsResult, FetchResult, StoreResult};

/// Persistent, identifier-addressed storage for key material
///
/// Backends own access control; the manager only ever addresses material by
/// the identifiers the caller configured.
pub trait KeyStorage: Send + Sync + 'static {
    /// Store `key_material` under `identifier`, replacing anything already there
    fn store(&self, identifier: &str, key_material: &[u8]) -> StoreResult;

    /// Fetch the material stored under `identifier`, `None` if absent
    fn fetch(&self, identifier: &str) -> FetchResult;

    /// Remove the material under `identifier`; absent material is not an error
    fn delete(&self, identifier: &str) -> DeleteResult;

    /// Check whether anything is stored under `identifier`
    fn exists(&self, identifier: &str) -> ExistsResult;

    /// Backend name for log output
    fn backend_name(&self) -> &'static str;
}
