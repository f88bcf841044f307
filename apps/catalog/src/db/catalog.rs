//! Read access to the canonical catalog tables.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Category, Product};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All active products, the working set for facet computation.
    pub async fn active_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, manufacturer, supplier, name, price, amount,
                   images, description, delivery_days, discount_pct,
                   recommended, group_codes, category_ids, active,
                   created_at, updated_at
            FROM products
            WHERE active
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::Error::Database)?;

        rows.iter().map(map_product).collect()
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, csv_id, name, parent_id FROM categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| Category {
                id: row.get("id"),
                csv_id: row.get("csv_id"),
                name: row.get("name"),
                parent_id: row.get("parent_id"),
            })
            .collect())
    }

    /// Analog partners of one product. Edges are stored once with the
    /// smaller uuid first, so both columns are checked.
    pub async fn analogs_of(&self, product_id: Uuid) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.code, p.manufacturer, p.supplier, p.name, p.price,
                   p.amount, p.images, p.description, p.delivery_days,
                   p.discount_pct, p.recommended, p.group_codes,
                   p.category_ids, p.active, p.created_at, p.updated_at
            FROM analogs a
            JOIN products p
              ON p.id = CASE WHEN a.product_low = $1 THEN a.product_high
                             ELSE a.product_low END
            WHERE ($1 IN (a.product_low, a.product_high)) AND p.active
            ORDER BY p.name, p.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::Error::Database)?;

        rows.iter().map(map_product).collect()
    }
}

fn map_product(row: &sqlx::postgres::PgRow) -> Result<Product> {
    Ok(Product {
        id: row.get("id"),
        code: row.get("code"),
        manufacturer: row.get("manufacturer"),
        supplier: row.get("supplier"),
        name: row.get("name"),
        price: row.get("price"),
        amount: row.get("amount"),
        images: row.get("images"),
        description: row.get("description"),
        delivery_days: row.get("delivery_days"),
        discount_pct: row.get("discount_pct"),
        recommended: row.get("recommended"),
        group_codes: row.get("group_codes"),
        category_ids: row.get("category_ids"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
