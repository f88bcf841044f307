//! Cross-reference linking of interchangeable products.
//!
//! The analog feed names products by manufacturer code, not by our ids.
//! Codes are matched through a canonical form (separator characters
//! stripped, lowercased) so that "WL 7073", "wl-7073" and "WL7073" all
//! meet. A link lands only when both sides resolve to exactly one
//! product; ambiguous or unknown references are skipped, never guessed.
//! Edges are undirected and stored once with the smaller uuid first.

use std::collections::{HashMap, HashSet};

use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use kolben_feeds::{analogs::canonical_code, AnalogRecord};

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalogLinkCounts {
    pub linked: u64,
    pub skipped: u64,
}

pub async fn link(
    tx: &mut Transaction<'_, Postgres>,
    records: &[AnalogRecord],
) -> Result<AnalogLinkCounts> {
    let index = load_product_index(tx).await?;

    let mut edges: HashSet<(Uuid, Uuid)> = HashSet::new();
    let mut skipped: u64 = 0;

    for record in records {
        let main = resolve(&index, &record.main_code, &record.main_brand);
        let other = resolve(&index, &record.code, &record.brand);
        match (main, other) {
            (Some(main), Some(other)) if main != other => {
                let edge = if main < other {
                    (main, other)
                } else {
                    (other, main)
                };
                edges.insert(edge);
            }
            _ => {
                skipped += 1;
                tracing::trace!(
                    main_code = %record.main_code,
                    main_brand = %record.main_brand,
                    code = %record.code,
                    brand = %record.brand,
                    "analog row did not resolve to two distinct products"
                );
            }
        }
    }

    let linked = insert_edges(tx, &edges).await?;
    tracing::info!(linked, skipped, candidates = records.len(), "analog linking complete");

    Ok(AnalogLinkCounts { linked, skipped })
}

// Every product resolves, active or not. Edges accumulate across imports
// only, so a feed arriving while a product is temporarily deactivated must
// still land its links; the listing side filters inactive rows instead.
async fn load_product_index(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<HashMap<(String, String), Vec<Uuid>>> {
    let rows = sqlx::query("SELECT id, code, manufacturer FROM products")
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

    let mut index: HashMap<(String, String), Vec<Uuid>> = HashMap::new();
    for row in &rows {
        let code: String = row.get("code");
        let manufacturer: String = row.get("manufacturer");
        let key = (canonical_code(&code), canonical_code(&manufacturer));
        index.entry(key).or_default().push(row.get("id"));
    }
    Ok(index)
}

/// Resolves one feed reference to a product id. `None` when the canonical
/// pair is unknown or matches more than one product.
fn resolve(
    index: &HashMap<(String, String), Vec<Uuid>>,
    code: &str,
    brand: &str,
) -> Option<Uuid> {
    let key = (canonical_code(code), canonical_code(brand));
    match index.get(&key).map(Vec::as_slice) {
        Some([id]) => Some(*id),
        _ => None,
    }
}

async fn insert_edges(
    tx: &mut Transaction<'_, Postgres>,
    edges: &HashSet<(Uuid, Uuid)>,
) -> Result<u64> {
    if edges.is_empty() {
        return Ok(0);
    }

    let mut lows = Vec::with_capacity(edges.len());
    let mut highs = Vec::with_capacity(edges.len());
    for &(low, high) in edges {
        lows.push(low);
        highs.push(high);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO analogs (product_low, product_high)
        SELECT low, high
        FROM UNNEST($1::uuid[], $2::uuid[]) AS pairs(low, high)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&lows)
    .bind(&highs)
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;

    Ok(result.rows_affected())
}
