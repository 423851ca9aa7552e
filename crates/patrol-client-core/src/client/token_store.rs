//! Where the bearer token lives between calls

use std::{fmt::Debug, sync::Mutex};

use secrecy::SecretString;

pub trait TokenStore: Debug + Send + Sync + 'static {
    fn get(&self) -> Option<SecretString>;
    fn set(&self, token: SecretString);
    fn clear(&self);
}

/// Lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<SecretString> {
        self.token.lock().expect("mutex poisoned").clone()
    }

    fn set(&self, token: SecretString) {
        *self.token.lock().expect("mutex poisoned") = Some(token);
    }

    fn clear(&self) {
        *self.token.lock().expect("mutex poisoned") = None;
    }
}

/// Browser local storage, survives reloads like the backend's cookie does
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageTokenStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageTokenStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStore for LocalStorageTokenStore {
    fn get(&self) -> Option<SecretString> {
        use patrol_shared::const_config::client::CLIENT_TOKEN_STORAGE_KEY;
        Self::storage()?
            .get_item(CLIENT_TOKEN_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    fn set(&self, token: SecretString) {
        use patrol_shared::const_config::client::CLIENT_TOKEN_STORAGE_KEY;
        use secrecy::ExposeSecret as _;
        let Some(storage) = Self::storage() else {
            tracing::warn!("local storage unavailable, token not kept");
            return;
        };
        if let Err(e) = storage.set_item(CLIENT_TOKEN_STORAGE_KEY, token.expose_secret()) {
            tracing::warn!(?e, "failed to store token");
        }
    }

    fn clear(&self) {
        use patrol_shared::const_config::client::CLIENT_TOKEN_STORAGE_KEY;
        if let Some(storage) = Self::storage() {
            if let Err(e) = storage.remove_item(CLIENT_TOKEN_STORAGE_KEY) {
                tracing::warn!(?e, "failed to remove token");
            }
        }
    }
}

/// The store used when none is provided
pub fn platform_token_store() -> std::sync::Arc<dyn TokenStore> {
    #[cfg(target_arch = "wasm32")]
    {
        std::sync::Arc::new(LocalStorageTokenStore)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::sync::Arc::new(MemoryTokenStore::default())
    }
}
