//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::error::{DriverError, PoolError, SchemaError, SqlModelError, ValueError};
pub use crate::executor::{execute, select};
pub use crate::field::{ColumnType, Field};
pub use crate::model::{FindOptions, Limit, Model, Record};
pub use crate::pool::{Connection, Connector, Pool, PoolConfig, PooledConnection};
pub use crate::results::CustomDbRow;
pub use crate::schema::{SchemaCell, TableSchema};
pub use crate::translation::{PlaceholderStyle, to_vendor_dialect};
pub use crate::types::{FromRowValue, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnector;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnector;
