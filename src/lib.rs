pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::services::config_service::ConfigService;
use crate::services::dashboard_service::DashboardService;
use crate::services::provider_service::{ClaimsProvider, SnapshotProvider};

/// The wired service graph handed to the presentation layer. The caller
/// owns the process entry point, logging initialization and the request
/// loop; this just assembles the pieces.
#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    config_service: Arc<ConfigService>,
    dashboard_service: Arc<DashboardService>,
}

impl AppState {
    /// Build against the environment-configured claims provider.
    pub fn new<P: AsRef<Path>>(db_path: P) -> AppResult<Self> {
        let provider = Arc::new(ClaimsProvider::from_env()?);
        Self::with_provider(db_path, provider)
    }

    /// Build with an explicit provider, for embedding and tests.
    pub fn with_provider<P: AsRef<Path>>(
        db_path: P,
        provider: Arc<dyn SnapshotProvider>,
    ) -> AppResult<Self> {
        let db_pool = DbPool::new(db_path.as_ref())?;
        let config_service = Arc::new(ConfigService::new(db_pool.clone()));
        let dashboard_service = Arc::new(DashboardService::new(
            Arc::clone(&config_service),
            provider,
        ));

        Ok(Self {
            db_pool,
            config_service,
            dashboard_service,
        })
    }

    pub fn db_pool(&self) -> &DbPool {
        &self.db_pool
    }

    pub fn config(&self) -> Arc<ConfigService> {
        Arc::clone(&self.config_service)
    }

    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard_service)
    }
}
