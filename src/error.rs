//! Error types for the migration run.
//!
//! Run-level failures abort the whole migration. Row-level failures skip one
//! record and let its pass continue.

use thiserror::Error;
use uuid::Uuid;

/// Errors that stop the run (or, for row-level database errors, one write).
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("Failed to acquire connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Target refused {entity} {id}")]
    Rejected { entity: &'static str, id: Uuid },
}

impl MigrateError {
    /// A statement the server rejected (constraint, cast, ...) only affects the row it wrote.
    /// Anything without a SQLSTATE means the store itself is gone.
    pub fn is_row_level(&self) -> bool {
        match self {
            MigrateError::Database(err) => err.as_db_error().is_some(),
            MigrateError::Rejected { .. } => true,
            _ => false,
        }
    }
}

/// Why a single legacy row was skipped.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row {id}: missing required field `{field}`")]
    MissingField { id: Uuid, field: &'static str },

    #[error("row {id}: invalid email `{email}`")]
    InvalidEmail { id: Uuid, email: String },

    #[error("column `{column}` could not be decoded: {source}")]
    Decode {
        column: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
