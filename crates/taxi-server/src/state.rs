use std::sync::Arc;

use taxi_core::{FleetStore, NewDriver};

use crate::config::ServerConfig;
use crate::session::SessionManager;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FleetStore>,
    pub sessions: Arc<SessionManager>,
    pub config: ServerConfig,
}

impl AppState {
    /// Open the store described by `config` and create the bootstrap staff
    /// account if one is configured.
    pub fn new(config: ServerConfig) -> taxi_core::Result<Self> {
        let store = FleetStore::open(config.store_config())?;
        let state = Self::with_store(config, store);
        state.bootstrap_admin()?;
        Ok(state)
    }

    /// State over an already opened store.
    pub fn with_store(config: ServerConfig, store: FleetStore) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(SessionManager::new(config.session_timeout)),
            config,
        }
    }

    fn bootstrap_admin(&self) -> taxi_core::Result<()> {
        let Some(admin) = &self.config.admin else {
            return Ok(());
        };

        if self.store.find_driver_by_username(&admin.username)?.is_some() {
            tracing::debug!(username = %admin.username, "admin account already present");
            return Ok(());
        }

        let driver = self
            .store
            .create_driver(NewDriver::new(&admin.username, &admin.password).staff())?;
        tracing::info!(id = driver.id, username = %driver.username, "created admin account");
        Ok(())
    }
}
