#![allow(unused)]
//! Only one import per feed type may run at a time; different feed types
//! do not block each other.

mod support;

use sqlx::Connection;
use support::{categories_csv, products_csv, with_test_state};

// Advisory lock coordinates used by the import service.
const LOCK_NAMESPACE: i32 = 0x4b42_4c4e;
const PRODUCTS_KEY: i32 = 1;

#[tokio::test]
async fn second_product_import_fails_while_the_lock_is_held() -> anyhow::Result<()> {
    with_test_state(|state| {
        Box::pin(async move {
            let url = support::test_database_url().unwrap();
            let mut rival = sqlx::PgConnection::connect(&url).await?;
            let mut tx = rival.begin().await?;
            sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
                .bind(LOCK_NAMESPACE)
                .bind(PRODUCTS_KEY)
                .execute(&mut *tx)
                .await?;

            let feed = products_csv(&["Mann,W6103,4,250.50,Oil filter,,,,2,10,main"]);
            let err = state.import_service.import_products(&feed).await;
            assert!(matches!(
                err,
                Err(kolben::Error::ConcurrentImport { .. })
            ));

            // A category import is a different feed type and proceeds.
            let categories = categories_csv(&["10,Filters,"]);
            let report = state.import_service.import_categories(&categories).await?;
            assert_eq!(report.upserted, 1);

            // Once the rival transaction ends, the product import succeeds.
            tx.rollback().await?;
            let report = state.import_service.import_products(&feed).await?;
            assert_eq!(report.inserted, 1);
            Ok(())
        })
    })
    .await
}
