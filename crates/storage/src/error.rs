use crate::schema::TABLE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("duplicate key value violates primary key: id={0}")]
    DuplicateKey(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),
}

impl Error {
    /// A missing or invisible `funding_state` row.
    pub fn not_found(id: &str) -> Self {
        Error::NotFound(format!("{TABLE} row '{id}'"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
