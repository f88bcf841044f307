//! Set-based merge of staged products into the canonical table.
//!
//! Products are identified by the (code, manufacturer, supplier) natural
//! key. A product row, once created, keeps its uuid forever: feed absence
//! deactivates it instead of deleting, and a later reappearance
//! reactivates the same row. The update statement only touches rows whose
//! staged tuple actually differs, so a repeated identical import writes
//! nothing.

use sqlx::{Postgres, Transaction};

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct ProductMergeCounts {
    pub inserted: u64,
    pub updated: u64,
    pub deactivated: u64,
}

// Staged list columns arrive as ';' joined text and are split here once,
// inside SQL, rather than round-tripping arrays through the COPY payload.
const IMAGES_EXPR: &str = "coalesce(string_to_array(nullif(s.images, ''), ';'), '{}')";
const GROUPS_EXPR: &str = "coalesce(string_to_array(nullif(s.group_codes, ''), ';'), '{}')";

pub async fn merge(tx: &mut Transaction<'_, Postgres>) -> Result<ProductMergeCounts> {
    let inserted = insert_missing(tx).await?;
    let updated = update_changed(tx).await?;
    let deactivated = deactivate_absent(tx).await?;

    tracing::info!(inserted, updated, deactivated, "product merge complete");

    Ok(ProductMergeCounts {
        inserted,
        updated,
        deactivated,
    })
}

async fn insert_missing(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    let sql = format!(
        r#"
        INSERT INTO products (id, code, manufacturer, supplier, name, price,
                              amount, images, description, delivery_days,
                              discount_pct, recommended, group_codes,
                              category_ids, active, created_at, updated_at)
        SELECT gen_random_uuid(), s.code, s.manufacturer, s.supplier, s.name,
               s.price, s.amount::int, {images}, s.description,
               s.delivery_days::int, 0, false, {groups}, '{{}}', true,
               now(), now()
        FROM staging_products s
        WHERE NOT EXISTS (
            SELECT 1 FROM products p
            WHERE p.code = s.code
              AND p.manufacturer = s.manufacturer
              AND p.supplier = s.supplier
        )
        "#,
        images = IMAGES_EXPR,
        groups = GROUPS_EXPR,
    );
    let result = sqlx::query(&sql)
        .execute(&mut **tx)
        .await
        .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

async fn update_changed(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    // `active = true` sits inside the compared tuple, so a previously
    // deactivated product reappearing in the feed counts as changed and
    // gets reactivated here.
    let sql = format!(
        r#"
        UPDATE products p
        SET name = s.name,
            price = s.price,
            amount = s.amount::int,
            images = {images},
            description = s.description,
            delivery_days = s.delivery_days::int,
            group_codes = {groups},
            active = true,
            updated_at = now()
        FROM staging_products s
        WHERE p.code = s.code
          AND p.manufacturer = s.manufacturer
          AND p.supplier = s.supplier
          AND (p.name, p.price, p.amount, p.images, p.description,
               p.delivery_days, p.group_codes, p.active)
              IS DISTINCT FROM
              (s.name, s.price, s.amount::int, {images}, s.description,
               s.delivery_days::int, {groups}, true)
        "#,
        images = IMAGES_EXPR,
        groups = GROUPS_EXPR,
    );
    let result = sqlx::query(&sql)
        .execute(&mut **tx)
        .await
        .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

async fn deactivate_absent(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products p
        SET active = false, updated_at = now()
        WHERE p.active
          AND NOT EXISTS (
              SELECT 1 FROM staging_products s
              WHERE s.code = p.code
                AND s.manufacturer = p.manufacturer
                AND s.supplier = p.supplier
          )
        "#,
    )
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

/// Rebuilds `products.category_ids` from `group_codes` against the current
/// category set. Runs after both product and category imports, since either
/// side can invalidate the mapping. Writes only rows whose array changed.
pub async fn recompute_category_ids(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products p
        SET category_ids = agg.ids, updated_at = now()
        FROM (
            SELECT p2.id,
                   coalesce(
                       array_agg(c.id ORDER BY c.id)
                           FILTER (WHERE c.id IS NOT NULL),
                       '{}'
                   ) AS ids
            FROM products p2
            LEFT JOIN categories c ON c.csv_id = ANY (p2.group_codes)
            GROUP BY p2.id
        ) agg
        WHERE agg.id = p.id
          AND p.category_ids IS DISTINCT FROM agg.ids
        "#,
    )
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;

    let relinked = result.rows_affected();
    if relinked > 0 {
        tracing::info!(relinked, "product category links recomputed");
    }
    Ok(relinked)
}
