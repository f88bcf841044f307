//! Product feed rows.
//!
//! One row per (code, manufacturer, supplier). Text fields are trimmed
//! and collapse to the empty string rather than null; numeric columns
//! tolerate an empty cell (zero) but reject garbage. Multi-valued cells
//! (photo URLs, group codes) are `;`-separated inside the field.

use rust_decimal::Decimal;

use crate::{codec, schema, FeedError, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub manufacturer: String,
    pub code: String,
    pub amount: i64,
    pub price: Decimal,
    pub name: String,
    pub images: Vec<String>,
    pub description: String,
    pub comment: String,
    pub delivery_days: i64,
    pub group_codes: Vec<String>,
    pub supplier: String,
}

impl ProductRecord {
    /// Staging values in schema column order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.manufacturer.clone()),
            Value::Text(self.code.clone()),
            Value::Integer(self.amount),
            Value::Numeric(self.price),
            Value::Text(self.name.clone()),
            Value::Text(self.images.join(";")),
            Value::Text(self.description.clone()),
            Value::Text(self.comment.clone()),
            Value::Integer(self.delivery_days),
            Value::Text(self.group_codes.join(";")),
            Value::Text(self.supplier.clone()),
        ]
    }
}

pub fn parse_products(buf: &[u8]) -> Result<Vec<ProductRecord>, FeedError> {
    let schema = &schema::PRODUCTS;
    let text = codec::decode(buf, schema.encoding)?;
    let mut reader = codec::reader(&text, schema.delimiter);

    let headers = reader
        .headers()
        .map_err(|source| FeedError::Csv { row: 1, source })?
        .clone();
    let pos = codec::header_positions(&headers, schema.columns)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        // Header is line 1; data starts on line 2.
        let line = idx as u64 + 2;
        let row = row.map_err(|source| FeedError::Csv { row: line, source })?;

        let field = |i: usize| normalize_text(row.get(pos[i]).unwrap_or_default());

        records.push(ProductRecord {
            manufacturer: field(0),
            code: field(1),
            amount: parse_integer(&field(2), line, "Кількість")?,
            price: parse_price(&field(3), line, "Ціна")?,
            name: field(4),
            images: split_list(&field(5)),
            description: field(6),
            comment: field(7),
            delivery_days: parse_integer(&field(8), line, "Доставка")?,
            group_codes: split_list(&field(9)),
            supplier: field(10),
        });
    }
    Ok(records)
}

/// Trim and collapse to the empty string (canonical columns are NOT NULL).
pub(crate) fn normalize_text(raw: &str) -> String {
    raw.trim().to_string()
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_integer(
    raw: &str,
    row: u64,
    column: &'static str,
) -> Result<i64, FeedError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| FeedError::InvalidInteger {
        row,
        column,
        value: raw.to_string(),
    })
}

pub(crate) fn parse_price(raw: &str, row: u64, column: &'static str) -> Result<Decimal, FeedError> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    // Legacy exports use a comma decimal separator inside quoted cells.
    raw.replace(',', ".")
        .parse()
        .map_err(|_| FeedError::InvalidNumber {
            row,
            column,
            value: raw.to_string(),
        })
}
