pub mod analog_link;
pub mod category_sync;
pub mod facets;
pub mod import;
pub mod product_sync;
pub mod search;

pub use facets::FacetService;
pub use import::{ImportReport, ImportService};
