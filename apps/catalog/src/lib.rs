//! Catalog core: bulk supplier feed ingestion and listing facets.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use error::{Error, Result};
pub use state::{AppState, AppStateOptions};
