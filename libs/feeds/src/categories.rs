//! Category feed rows: flat (id, name, parent id) triples keyed by the
//! source's stable `csvId`. Parent references are resolved in a second
//! pass by the hierarchy resolver, never here.

use crate::{codec, schema, FeedError, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub csv_id: String,
    pub name: String,
    pub parent_csv_id: Option<String>,
}

impl CategoryRecord {
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.csv_id.clone()),
            Value::Text(self.name.clone()),
            Value::Text(self.parent_csv_id.clone().unwrap_or_default()),
        ]
    }
}

pub fn parse_categories(buf: &[u8]) -> Result<Vec<CategoryRecord>, FeedError> {
    let schema = &schema::CATEGORIES;
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

        let csv_id = crate::products::normalize_text(row.get(pos[0]).unwrap_or_default());
        let name = crate::products::normalize_text(row.get(pos[1]).unwrap_or_default());
        let parent = crate::products::normalize_text(row.get(pos[2]).unwrap_or_default());

        records.push(CategoryRecord {
            csv_id,
            name,
            parent_csv_id: if parent.is_empty() { None } else { Some(parent) },
        });
    }
    Ok(records)
}
