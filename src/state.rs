use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{AddressService, ContactService, UserService};

/// Shared router state: the store and the configuration it was opened with.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone())
    }

    pub fn contacts(&self) -> ContactService {
        ContactService::new(self.store.clone())
    }

    pub fn addresses(&self) -> AddressService {
        AddressService::new(self.store.clone())
    }
}
