use std::sync::{Arc, OnceLock};

use crate::error::SchemaError;

use super::TableSchema;

/// Holds the bound schema of one record type.
///
/// Meant to live in a `static` inside the type's [`Model::schema`](crate::Model::schema)
/// implementation. The first call binds; every later call returns the same `Arc`, or the
/// same binding error.
///
/// ```rust
/// use std::sync::Arc;
/// use sql_model::prelude::*;
///
/// fn user_schema() -> Result<Arc<TableSchema>, SchemaError> {
///     static SCHEMA: SchemaCell = SchemaCell::new();
///     SCHEMA.get_or_bind(|| {
///         TableSchema::builder("User")
///             .table("users")
///             .field("id", Field::integer().primary_key())
///             .field("name", Field::string())
///             .bind()
///     })
/// }
///
/// let a = user_schema().unwrap();
/// let b = user_schema().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct SchemaCell {
    bound: OnceLock<Result<Arc<TableSchema>, SchemaError>>,
}

impl SchemaCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bound: OnceLock::new(),
        }
    }

    /// Return the bound schema, running `bind` only if nothing is cached yet.
    ///
    /// # Errors
    ///
    /// Returns the (cached) `SchemaError` if binding failed.
    pub fn get_or_bind<F>(&self, bind: F) -> Result<Arc<TableSchema>, SchemaError>
    where
        F: FnOnce() -> Result<TableSchema, SchemaError>,
    {
        self.bound.get_or_init(|| bind().map(Arc::new)).clone()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound.get().is_some()
    }
}
