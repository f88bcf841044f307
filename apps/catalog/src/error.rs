//! Crate-wide error type.
//!
//! All ingestion failures roll the enclosing transaction back; none of
//! these variants can leave a partially applied import behind.

use kolben_feeds::{FeedError, FeedKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The uploaded buffer cannot be parsed under the feed's declared
    /// schema, delimiter or encoding.
    #[error("malformed feed input: {0}")]
    MalformedInput(#[from] FeedError),

    /// A declared staging constraint (natural-key uniqueness, column
    /// type) was breached while loading the feed.
    #[error("feed violates constraint {constraint}: {message}")]
    ConstraintViolation { constraint: String, message: String },

    /// Another import of the same feed type is already running.
    #[error("another {feed} import is already in progress")]
    ConcurrentImport { feed: FeedKind },

    /// A facet query parameter is outside its allowed domain.
    #[error("invalid value for {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Map a sqlx error, turning unique violations raised by the staging
    /// load or merge into the dedicated constraint variant.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return Error::ConstraintViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                    message: db.message().to_string(),
                };
            }
        }
        Error::Database(err)
    }
}
