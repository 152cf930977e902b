//! vigil-state — the shared key-value store behind the alert rate limiter.
//!
//! The limiter only needs `get` and `set` on string keys, expressed by the
//! [`KvStore`] trait. Three backends implement it:
//!
//! - [`RedbStore`]: embedded [redb](https://docs.rs/redb) database, on disk
//!   or in memory.
//! - [`MemoryStore`]: a mutex-guarded map, for tests and one-off runs.
//! - [`RestStore`]: an Upstash-compatible REST key-value service, shared by
//!   every process that points at it.
//!
//! [`open_store`] picks one from [`vigil_core::config::StoreConfig`].

pub mod error;
pub mod memory;
pub mod rest;
pub mod store;
pub mod tables;

use std::sync::Arc;

use async_trait::async_trait;
use vigil_core::StoreBackend;
use vigil_core::config::StoreConfig;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::RedbStore;

/// String key-value store shared between health check invocations.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Open the backend selected by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Redb => Arc::new(RedbStore::open(&config.path)?),
        StoreBackend::Rest => {
            let url = config
                .rest_url
                .as_deref()
                .ok_or_else(|| StoreError::Open("rest store requires a URL".to_string()))?;
            let token = config
                .rest_token
                .as_deref()
                .ok_or_else(|| StoreError::Open("rest store requires a token".to_string()))?;
            Arc::new(RestStore::new(url, token)?)
        }
    };
    Ok(store)
}
