//! Feed schema definitions.
//!
//! A [`FeedSchema`] describes one feed's staging relation: the typed
//! columns in source order, the natural-key tuple enforced at load time,
//! and the delimiter/encoding pair the supplier exports with. Schemas are
//! configuration data; the staging loader renders them into SQL without
//! knowing anything feed-specific.

use rust_decimal::Decimal;

use crate::FeedKind;

/// Text encoding of the raw feed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1251,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Windows1251 => "Windows-1251",
        }
    }
}

/// SQL type of a staging column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Numeric,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT NOT NULL DEFAULT ''",
            ColumnType::Integer => "BIGINT NOT NULL DEFAULT 0",
            ColumnType::Numeric => "NUMERIC(12,2) NOT NULL DEFAULT 0",
        }
    }
}

/// One staging column: the source header name and the staging-side name/type.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Header name as it appears in the supplier file.
    pub source: &'static str,
    /// Identifier used for the staging relation column.
    pub name: &'static str,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedSchema {
    pub kind: FeedKind,
    /// Staging relation name (session-local temp table).
    pub table: &'static str,
    pub columns: &'static [Column],
    /// Staging-side column names forming the natural key.
    pub natural_key: &'static [&'static str],
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

/// A single typed staging value, in schema column order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Numeric(Decimal),
}

pub static PRODUCTS: FeedSchema = FeedSchema {
    kind: FeedKind::Products,
    table: "staging_products",
    columns: &[
        Column { source: "Бренд", name: "manufacturer", ty: ColumnType::Text },
        Column { source: "Артикул", name: "code", ty: ColumnType::Text },
        Column { source: "Кількість", name: "amount", ty: ColumnType::Integer },
        Column { source: "Ціна", name: "price", ty: ColumnType::Numeric },
        Column { source: "Назва", name: "name", ty: ColumnType::Text },
        Column { source: "Фото", name: "images", ty: ColumnType::Text },
        Column { source: "Опис", name: "description", ty: ColumnType::Text },
        Column { source: "Коментар", name: "comment", ty: ColumnType::Text },
        Column { source: "Доставка", name: "delivery_days", ty: ColumnType::Integer },
        Column { source: "Група", name: "group_codes", ty: ColumnType::Text },
        Column { source: "Постачальник", name: "supplier", ty: ColumnType::Text },
    ],
    natural_key: &["code", "manufacturer", "supplier"],
    delimiter: b',',
    encoding: TextEncoding::Utf8,
};

pub static CATEGORIES: FeedSchema = FeedSchema {
    kind: FeedKind::Categories,
    table: "staging_categories",
    columns: &[
        Column { source: "Id", name: "csv_id", ty: ColumnType::Text },
        Column { source: "Name", name: "name", ty: ColumnType::Text },
        Column { source: "Parent_Id", name: "parent_csv_id", ty: ColumnType::Text },
    ],
    natural_key: &["csv_id"],
    delimiter: b',',
    encoding: TextEncoding::Utf8,
};

pub static ANALOGS: FeedSchema = FeedSchema {
    kind: FeedKind::Analogs,
    table: "staging_analogs",
    columns: &[
        Column { source: "NAME_PARTS", name: "name", ty: ColumnType::Text },
        Column { source: "mainART_BRANDS", name: "main_brand", ty: ColumnType::Text },
        Column { source: "mainART_CODE_PARTS", name: "main_code", ty: ColumnType::Text },
        Column { source: "TTC_ART_ID", name: "ttc_art_id", ty: ColumnType::Text },
        Column { source: "BRANDS", name: "brand", ty: ColumnType::Text },
        Column { source: "CODE_PARTS", name: "code", ty: ColumnType::Text },
        Column { source: "CODE_PARTS_ADVANCED", name: "code_advanced", ty: ColumnType::Text },
    ],
    // An analog row is identified by the pair of (code, brand) sides.
    natural_key: &["main_code", "main_brand", "code", "brand"],
    delimiter: b';',
    encoding: TextEncoding::Windows1251,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_keys_reference_declared_columns() {
        for schema in [&PRODUCTS, &CATEGORIES, &ANALOGS] {
            for key in schema.natural_key {
                assert!(
                    schema.columns.iter().any(|c| c.name == *key),
                    "{}: natural key column {} not declared",
                    schema.table,
                    key
                );
            }
        }
    }

    #[test]
    fn analog_feed_uses_legacy_export_settings() {
        assert_eq!(ANALOGS.delimiter, b';');
        assert_eq!(ANALOGS.encoding, TextEncoding::Windows1251);
        assert_eq!(PRODUCTS.encoding, TextEncoding::Utf8);
    }
}
