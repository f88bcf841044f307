//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    db::{self, CatalogRepository},
    services::{FacetService, ImportService},
    Result,
};

#[derive(Debug, Clone)]
pub struct AppStateOptions {
    pub run_migrations: bool,
}

impl Default for AppStateOptions {
    fn default() -> Self {
        Self {
            run_migrations: true,
        }
    }
}

/// Shared application state passed to all entry points
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub catalog: CatalogRepository,
    pub import_service: Arc<ImportService>,
    pub facet_service: Arc<FacetService>,
}

impl AppState {
    /// Initialize the application state
    pub async fn new(config: Config) -> Result<Self> {
        Self::new_with_options(config, AppStateOptions::default()).await
    }

    pub async fn new_with_options(config: Config, options: AppStateOptions) -> Result<Self> {
        let db_pool = db::create_db_pool(&config.database).await?;

        if options.run_migrations {
            db::run_migrations(&db_pool).await?;
        } else {
            tracing::info!("Skipping database migrations (disabled by options)");
        }

        let catalog = CatalogRepository::new(db_pool.clone());
        let import_service = Arc::new(ImportService::new(db_pool.clone()));
        let facet_service = Arc::new(FacetService::new(db_pool.clone()));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            catalog,
            import_service,
            facet_service,
        })
    }

    /// Gracefully close the database pool
    pub async fn shutdown(&self) {
        self.db_pool.close().await;
    }
}
