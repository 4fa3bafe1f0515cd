//! Shared application state.

use std::sync::Arc;
use trim_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::notify::Notifier;

/// Everything a request handler may touch. Cloned behind an `Arc`.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, notifier: Arc<dyn Notifier>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState {
            db,
            config,
            jwt,
            notifier,
        }
    }
}
