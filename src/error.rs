use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "postgres")]
use tokio_postgres;

#[derive(Debug, Error)]
pub enum SqlModelError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Failures while binding field declarations into a table schema.
///
/// These surface the first time a record type's schema is requested and are cached
/// from then on; they are never recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("primary key not found for model {model}")]
    MissingPrimaryKey { model: String },

    #[error("duplicate primary key for field: {field}")]
    DuplicatePrimaryKey { field: String },

    #[error("duplicate declaration for field: {field}")]
    DuplicateField { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("connection pool is not initialized")]
    NotInitialized,

    #[error("connection pool is already initialized")]
    AlreadyInitialized,

    #[error("connection pool is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("invalid limit value: {0}")]
    InvalidLimit(String),

    #[error("record has no attribute: {0}")]
    NoSuchAttribute(String),

    #[error("table {table} has no column: {column}")]
    UnknownColumn { table: String, column: String },

    #[error("column {column} holds {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },
}

/// Errors reported by the underlying database driver, passed through unchanged.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("database worker task failed: {0}")]
    Task(String),

    #[error("Other database error: {0}")]
    Other(String),
}
