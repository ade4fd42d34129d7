//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    config::CartConfig,
    manager::CartManager,
    remote::{HttpCartStore, RemoteCartError, RemoteCartStore},
    storage::{FileKeyValueStore, GuestCartStore, KeyValueStore},
};

/// Errors raised while wiring the application.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The HTTP client for the cart API could not be built.
    #[error("failed to build cart API client")]
    HttpClient(#[source] RemoteCartError),
}

/// The adapters a cart session runs on.
#[derive(Clone)]
pub struct AppContext {
    /// Device-local key-value storage.
    pub local: Arc<dyn KeyValueStore>,

    /// Account cart storage.
    pub remote: Arc<dyn RemoteCartStore>,

    storage_key: String,
}

impl AppContext {
    /// Build the context from explicit adapters.
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteCartStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            local,
            remote,
            storage_key: storage_key.into(),
        }
    }

    /// Build the context from configuration: file-backed local storage and
    /// the HTTP cart API.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built or the API base
    /// URL cannot carry a path.
    pub fn from_config(config: &CartConfig) -> Result<Self, AppInitError> {
        let remote = HttpCartStore::new(
            config.remote.api_base_url.clone(),
            config.remote.request_timeout(),
        )
        .map_err(AppInitError::HttpClient)?;

        Ok(Self::new(
            Arc::new(FileKeyValueStore::new(&config.storage.storage_dir)),
            Arc::new(remote),
            config.storage.storage_key.as_str(),
        ))
    }

    /// The guest cart kept in local storage.
    pub fn guest_cart(&self) -> GuestCartStore {
        GuestCartStore::new(Arc::clone(&self.local), self.storage_key.as_str())
    }

    /// Start a guest session manager on these adapters.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_manager(&self) -> CartManager {
        CartManager::spawn(self.guest_cart(), Arc::clone(&self.remote))
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}
