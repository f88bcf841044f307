//! Analog cross-reference feed rows.
//!
//! Each row names two article sides: the main article
//! (`mainART_CODE_PARTS` / `mainART_BRANDS`) and its analog
//! (`CODE_PARTS` / `BRANDS`). Matching against canonical products is
//! fuzzy: both code and brand are canonicalized by stripping a fixed set
//! of separator characters and lowercasing, so "W 610/3" and "w610-3"
//! resolve to the same article.

use crate::{codec, schema, FeedError, Value};

/// Characters removed from codes and brands before matching.
const STRIPPED: &[char] = &[
    ' ', '\t', '.', ',', '-', '_', '/', '\\', '\'', '"', '(', ')', '+', ';', ':', '*', '#',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogRecord {
    pub name: String,
    pub main_brand: String,
    pub main_code: String,
    pub ttc_art_id: String,
    pub brand: String,
    pub code: String,
    pub code_advanced: String,
}

impl AnalogRecord {
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.main_brand.clone()),
            Value::Text(self.main_code.clone()),
            Value::Text(self.ttc_art_id.clone()),
            Value::Text(self.brand.clone()),
            Value::Text(self.code.clone()),
            Value::Text(self.code_advanced.clone()),
        ]
    }
}

/// Canonical form of an article code or brand for fuzzy matching.
pub fn canonical_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !STRIPPED.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn parse_analogs(buf: &[u8]) -> Result<Vec<AnalogRecord>, FeedError> {
    let schema = &schema::ANALOGS;
    let text = codec::decode(buf, schema.encoding)?;
    let mut reader = codec::reader(&text, schema.delimiter);

    let headers = reader
        .headers()
        .map_err(|source| FeedError::Csv { row: 1, source })?
        .clone();
    let pos = codec::header_positions(&headers, schema.columns)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let line = idx as u64 + 2;
        let row = row.map_err(|source| FeedError::Csv { row: line, source })?;

        let field = |i: usize| crate::products::normalize_text(row.get(pos[i]).unwrap_or_default());

        records.push(AnalogRecord {
            name: field(0),
            main_brand: field(1),
            main_code: field(2),
            ttc_art_id: field(3),
            brand: field(4),
            code: field(5),
            code_advanced: field(6),
        });
    }
    Ok(records)
}
