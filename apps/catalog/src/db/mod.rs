pub mod catalog;
pub mod staging;

pub use catalog::CatalogRepository;

use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::error::Result;

pub async fn create_db_pool(config: &DatabaseConfig) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.statement_timeout_seconds;
    let lock_timeout = config.lock_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.pool_min_size)
        .max_connections(config.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(config.pool_timeout_seconds))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                // Set statement timeout (max query execution time)
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;

                // Set lock timeout (max lock wait time - fail fast)
                sqlx::query(&format!("SET lock_timeout = '{}s'", lock_timeout))
                    .execute(&mut *conn)
                    .await?;

                Ok(())
            })
        })
        .connect(&config.url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.pool_min_size,
        config.pool_max_size
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations complete");
    Ok(())
}
