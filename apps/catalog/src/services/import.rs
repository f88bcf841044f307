//! Feed import orchestration.
//!
//! One import is one transaction: take the per-feed advisory lock, stage
//! the parsed rows, run the merge statements, commit. Any failure along
//! the way rolls everything back, including the staging table. Parsing
//! happens before the transaction opens, so malformed input never holds
//! the lock.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use kolben_feeds::{parse_analogs, parse_categories, parse_products, FeedKind};

use crate::db::staging;
use crate::error::{Error, Result};
use crate::services::{analog_link, category_sync, product_sync};

// Advisory lock namespace for feed imports. The second key is the feed
// discriminant, so imports of different feed types can run concurrently.
const IMPORT_LOCK_NAMESPACE: i32 = 0x4b42_4c4e;

fn feed_lock_key(feed: FeedKind) -> i32 {
    match feed {
        FeedKind::Products => 1,
        FeedKind::Categories => 2,
        FeedKind::Analogs => 3,
    }
}

/// Outcome of one import run, suitable for structured logging and for the
/// CLI's JSON output. Counters that do not apply to the feed type stay
/// zero.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub feed: &'static str,
    /// Rows staged after in-feed natural-key deduplication.
    pub staged: u64,
    pub inserted: u64,
    pub updated: u64,
    pub upserted: u64,
    pub deactivated: u64,
    pub deleted: u64,
    /// Products whose category links were rebuilt.
    pub relinked: u64,
    pub linked: u64,
    pub skipped: u64,
}

#[derive(Clone)]
pub struct ImportService {
    pool: PgPool,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn import_products(&self, buf: &[u8]) -> Result<ImportReport> {
        let records = parse_products(buf)?;
        let rows: Vec<_> = records.iter().map(|r| r.values()).collect();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        acquire_feed_lock(&mut tx, FeedKind::Products).await?;

        let staged = staging::load(&mut tx, FeedKind::Products.schema(), &rows).await?;
        let counts = product_sync::merge(&mut tx).await?;
        let relinked = product_sync::recompute_category_ids(&mut tx).await?;

        tx.commit().await.map_err(Error::Database)?;

        let report = ImportReport {
            feed: FeedKind::Products.as_str(),
            staged,
            inserted: counts.inserted,
            updated: counts.updated,
            deactivated: counts.deactivated,
            relinked,
            ..ImportReport::default()
        };
        tracing::info!(?report, "product import committed");
        Ok(report)
    }

    pub async fn import_categories(&self, buf: &[u8]) -> Result<ImportReport> {
        let records = parse_categories(buf)?;
        let rows: Vec<_> = records.iter().map(|r| r.values()).collect();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        acquire_feed_lock(&mut tx, FeedKind::Categories).await?;

        let staged = staging::load(&mut tx, FeedKind::Categories.schema(), &rows).await?;
        let counts = category_sync::sync(&mut tx, &records).await?;
        // A changed hierarchy can remap products even when the product
        // feed itself did not change.
        let relinked = product_sync::recompute_category_ids(&mut tx).await?;

        tx.commit().await.map_err(Error::Database)?;

        let report = ImportReport {
            feed: FeedKind::Categories.as_str(),
            staged,
            upserted: counts.upserted,
            deleted: counts.deleted,
            relinked,
            ..ImportReport::default()
        };
        tracing::info!(?report, "category import committed");
        Ok(report)
    }

    pub async fn import_analogs(&self, buf: &[u8]) -> Result<ImportReport> {
        let records = parse_analogs(buf)?;
        let rows: Vec<_> = records.iter().map(|r| r.values()).collect();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        acquire_feed_lock(&mut tx, FeedKind::Analogs).await?;

        let staged = staging::load(&mut tx, FeedKind::Analogs.schema(), &rows).await?;
        let counts = analog_link::link(&mut tx, &records).await?;

        tx.commit().await.map_err(Error::Database)?;

        let report = ImportReport {
            feed: FeedKind::Analogs.as_str(),
            staged,
            linked: counts.linked,
            skipped: counts.skipped,
            ..ImportReport::default()
        };
        tracing::info!(?report, "analog import committed");
        Ok(report)
    }
}

/// Per-feed advisory lock, released with the transaction. A second import
/// of the same feed type fails immediately instead of queueing behind a
/// potentially long merge.
async fn acquire_feed_lock(
    tx: &mut Transaction<'_, Postgres>,
    feed: FeedKind,
) -> Result<()> {
    let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1, $2)")
        .bind(IMPORT_LOCK_NAMESPACE)
        .bind(feed_lock_key(feed))
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
    if !locked {
        return Err(Error::ConcurrentImport { feed });
    }
    Ok(())
}
