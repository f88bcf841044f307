//! Canonical domain types

pub mod category;
pub mod facet;
pub mod product;

pub use category::{Category, CategoryForest};
pub use facet::{DiscountState, Facet, FacetKind, FacetQuery, FilterValue};
pub use product::{Availability, Product};
