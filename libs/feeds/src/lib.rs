//! Supplier feed formats for the kolben catalog.
//!
//! Each feed type (products, categories, analogs) arrives as a delimited
//! text file with its own column set, delimiter and text encoding. This
//! crate owns the schema definitions, byte-buffer decoding, row parsing
//! and the text normalization rules applied before anything touches the
//! database. It has no database dependencies and is fully testable on
//! its own.

use thiserror::Error;

pub mod analogs;
pub mod categories;
pub mod codec;
pub mod products;
pub mod schema;

pub use analogs::{canonical_code, parse_analogs, AnalogRecord};
pub use categories::{parse_categories, CategoryRecord};
pub use products::{parse_products, ProductRecord};
pub use schema::{Column, ColumnType, FeedSchema, TextEncoding, Value};

/// The three feed types a supplier can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Products,
    Categories,
    Analogs,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Products => "products",
            FeedKind::Categories => "categories",
            FeedKind::Analogs => "analogs",
        }
    }

    pub fn schema(&self) -> &'static FeedSchema {
        match self {
            FeedKind::Products => &schema::PRODUCTS,
            FeedKind::Categories => &schema::CATEGORIES,
            FeedKind::Analogs => &schema::ANALOGS,
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed is not valid {encoding} text")]
    Encoding { encoding: &'static str },
    #[error("missing column {column:?} in feed header")]
    MissingColumn { column: &'static str },
    #[error("row {row}: {source}")]
    Csv { row: u64, source: csv::Error },
    #[error("row {row}, column {column:?}: invalid integer {value:?}")]
    InvalidInteger {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("row {row}, column {column:?}: invalid number {value:?}")]
    InvalidNumber {
        row: u64,
        column: &'static str,
        value: String,
    },
}
