//! Product rows as stored in the canonical `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Derived stock state. A product never disappears from the catalog;
/// absence from a feed only flips it to `NotAvailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    NotAvailable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub manufacturer: String,
    pub supplier: String,
    pub name: String,
    pub price: Decimal,
    pub amount: i32,
    pub images: Vec<String>,
    pub description: String,
    pub delivery_days: i32,
    pub discount_pct: i32,
    pub recommended: bool,
    pub group_codes: Vec<String>,
    pub category_ids: Vec<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn availability(&self) -> Availability {
        if self.active {
            Availability::Available
        } else {
            Availability::NotAvailable
        }
    }

    pub fn has_discount(&self) -> bool {
        self.discount_pct > 0
    }
}
