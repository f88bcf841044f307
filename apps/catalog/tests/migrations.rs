#![allow(unused)]
//! The migration runner works standalone, independent of whether state
//! construction was configured to migrate.

mod support;

use kolben::{config::Config, db, AppState, AppStateOptions};

#[tokio::test]
async fn explicit_migration_run_brings_the_schema_up() -> anyhow::Result<()> {
    let Some(url) = support::test_database_url() else {
        eprintln!(
            "skipping: set KOLBEN__DATABASE__TEST_DATABASE_URL to run database tests"
        );
        return Ok(());
    };

    let mut config = Config::load()?;
    config.database.url = url;
    config.database.pool_max_size = 5;

    // State built without migrating; the explicit runner must still get
    // the schema in place (and is a no-op when it already is).
    let state = AppState::new_with_options(
        config,
        AppStateOptions {
            run_migrations: false,
        },
    )
    .await?;

    db::run_migrations(&state.db_pool).await?;
    db::run_migrations(&state.db_pool).await?;

    let count = support::count(&state, "SELECT count(*) FROM products WHERE false").await?;
    assert_eq!(count, 0);

    state.shutdown().await;
    Ok(())
}
