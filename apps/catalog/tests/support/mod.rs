//! Shared plumbing for database-backed tests.
//!
//! Tests run against a real Postgres instance named by
//! `KOLBEN__DATABASE__TEST_DATABASE_URL` (or `DATABASE_URL`). When neither
//! is set, every test skips with a notice instead of failing, so the pure
//! unit suite stays runnable anywhere. Tests share one database and are
//! serialized through a process-wide lock; each one starts from truncated
//! tables.

use std::future::Future;
use std::pin::Pin;

use sqlx::Row;
use uuid::Uuid;

use kolben::{config::Config, AppState};

static TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

pub fn test_database_url() -> Option<String> {
    std::env::var("KOLBEN__DATABASE__TEST_DATABASE_URL")
        .ok()
        .or_else(|| std::env::var("DATABASE_URL").ok())
}

pub async fn with_test_state<F>(test: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(
        &'a AppState,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>,
{
    let Some(url) = test_database_url() else {
        eprintln!(
            "skipping: set KOLBEN__DATABASE__TEST_DATABASE_URL to run database tests"
        );
        return Ok(());
    };

    let _guard = TEST_LOCK.lock().await;

    let mut config = Config::load()?;
    config.database.url = url;
    config.database.pool_max_size = 5;

    let state = AppState::new(config).await?;
    sqlx::query("TRUNCATE analogs, products, categories")
        .execute(&state.db_pool)
        .await?;

    let result = test(&state).await;
    state.shutdown().await;
    result
}

/// Minimal product feed in the supplier's column layout.
pub fn products_csv(rows: &[&str]) -> Vec<u8> {
    let mut csv = String::from(
        "Бренд,Артикул,Кількість,Ціна,Назва,Фото,Опис,Коментар,Доставка,Група,Постачальник\n",
    );
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv.into_bytes()
}

pub fn categories_csv(rows: &[&str]) -> Vec<u8> {
    let mut csv = String::from("Id,Name,Parent_Id\n");
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv.into_bytes()
}

/// Analog feed bytes, encoded the way the supplier actually ships them.
pub fn analogs_csv(rows: &[&str]) -> Vec<u8> {
    let mut csv = String::from(
        "NAME_PARTS;mainART_BRANDS;mainART_CODE_PARTS;TTC_ART_ID;BRANDS;CODE_PARTS;CODE_PARTS_ADVANCED\n",
    );
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode(&csv);
    encoded.into_owned()
}

pub async fn product_id(state: &AppState, code: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM products WHERE code = $1")
        .bind(code)
        .fetch_one(&state.db_pool)
        .await?;
    Ok(row.get("id"))
}

pub async fn product_field<T>(state: &AppState, code: &str, field: &str) -> anyhow::Result<T>
where
    for<'r> T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + Unpin,
{
    let row = sqlx::query(&format!("SELECT {field} FROM products WHERE code = $1"))
        .bind(code)
        .fetch_one(&state.db_pool)
        .await?;
    Ok(row.get(0))
}

pub async fn count(state: &AppState, sql: &str) -> anyhow::Result<i64> {
    let row = sqlx::query(sql).fetch_one(&state.db_pool).await?;
    Ok(row.get(0))
}

pub async fn category_id(state: &AppState, csv_id: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM categories WHERE csv_id = $1")
        .bind(csv_id)
        .fetch_one(&state.db_pool)
        .await?;
    Ok(row.get("id"))
}
