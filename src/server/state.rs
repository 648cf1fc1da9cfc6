//! Shared handler state
//!
//! Everything here is immutable after startup; handlers share no mutable state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::render::RenditionCache;

#[derive(Debug, Clone)]
pub struct AppState {
    pub data_root: Arc<PathBuf>,
    pub credentials: Arc<CredentialStore>,
    pub renditions: Arc<RenditionCache>,
    /// Lifetime advertised for rendered images
    pub render_max_age: Duration,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            data_root: Arc::new(config.data_root_path()),
            credentials: Arc::new(CredentialStore::from_users(&config.users)),
            renditions: Arc::new(RenditionCache::from_config(config)),
            render_max_age: Duration::from_secs(config.render_max_age_secs),
        }
    }
}
