//! Minimal async record mapping.
//!
//! Declare a record type's fields once, bind them into a [`TableSchema`] holding the
//! table name, primary key and the four canonical statements, then run those statements
//! through a shared [`Pool`] of SQLite or Postgres connections.
//!
//! ```rust,no_run
//! use sql_model::prelude::*;
//!
//! # async fn run() -> Result<(), SqlModelError> {
//! let users = std::sync::Arc::new(
//!     TableSchema::builder("User")
//!         .table("users")
//!         .field("id", Field::integer().primary_key())
//!         .field("name", Field::string())
//!         .field("email", Field::string())
//!         .bind()?,
//! );
//!
//! let pool = Pool::sqlite();
//! pool.initialize(PoolConfig::new("", "", "app.db")).await?;
//!
//! let mut user = Record::new(users.clone())
//!     .with("id", 42)
//!     .with("name", "a")
//!     .with("email", "a@x.com");
//! user.save(&pool).await?;
//!
//! let found = users.find_by_key(&pool, 42).await?;
//! assert_eq!(found.as_ref(), Some(&user));
//!
//! pool.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod field;
pub mod model;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{DriverError, PoolError, SchemaError, SqlModelError, ValueError};
pub use field::{ColumnType, Field};
pub use model::{FindOptions, Limit, Model, Record};
pub use pool::{Pool, PoolConfig};
pub use results::CustomDbRow;
pub use schema::{SchemaCell, TableSchema};
pub use types::{FromRowValue, RowValues};

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctests;
