//! Records and the query operations of a bound schema.
//!
//! Untyped access goes through [`TableSchema`] and [`Record`]; typed structs implement
//! [`Model`] and get the same operations as provided methods.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{SchemaError, SqlModelError, ValueError};
use crate::executor;
use crate::pool::Pool;
use crate::schema::TableSchema;
use crate::types::RowValues;

pub mod find;
mod record;

pub use find::{FindOptions, Limit};
pub use record::Record;

impl TableSchema {
    /// The row whose primary key equals `key`, or `None`.
    ///
    /// # Errors
    ///
    /// Pool and driver errors.
    pub async fn find_by_key(
        self: &Arc<Self>,
        pool: &Pool,
        key: impl Into<RowValues> + Send,
    ) -> Result<Option<Record>, SqlModelError> {
        let stmt = find::find_by_key(self, key.into());
        let rows = executor::select(pool, &stmt.sql, &stmt.args, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| Record::from_row(Arc::clone(self), row)))
    }

    /// Rows matching `options`.
    ///
    /// # Errors
    ///
    /// `ValueError::InvalidLimit` for a malformed limit; pool and driver errors.
    pub async fn find_all(
        self: &Arc<Self>,
        pool: &Pool,
        options: &FindOptions,
    ) -> Result<Vec<Record>, SqlModelError> {
        let stmt = find::find_all(self, options)?;
        self.fetch(pool, &stmt.sql, &stmt.args).await
    }

    /// Rows where every given column equals its value.
    ///
    /// # Errors
    ///
    /// `ValueError::UnknownColumn` for a column outside the schema; pool and driver errors.
    pub async fn find_all_by(
        self: &Arc<Self>,
        pool: &Pool,
        pairs: &[(&str, RowValues)],
    ) -> Result<Vec<Record>, SqlModelError> {
        let stmt = find::find_all_by_equality(self, pairs)?;
        self.fetch(pool, &stmt.sql, &stmt.args).await
    }

    /// Scalar aggregate over the table, e.g. `count(*)`; `None` when no row comes back.
    ///
    /// # Errors
    ///
    /// Pool and driver errors.
    pub async fn count(
        &self,
        pool: &Pool,
        expression: &str,
        where_clause: Option<&str>,
        args: &[RowValues],
    ) -> Result<Option<RowValues>, SqlModelError> {
        let stmt = find::count(self, expression, where_clause, args);
        let rows = executor::select(pool, &stmt.sql, &stmt.args, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get(find::COUNT_ALIAS).cloned()))
    }

    async fn fetch(
        self: &Arc<Self>,
        pool: &Pool,
        sql: &str,
        args: &[RowValues],
    ) -> Result<Vec<Record>, SqlModelError> {
        let rows = executor::select(pool, sql, args, None).await?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(Arc::clone(self), row))
            .collect())
    }
}

/// A typed row-shaped struct persisted through a bound [`TableSchema`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sql_model::prelude::*;
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// static USER: SchemaCell = SchemaCell::new();
///
/// impl Model for User {
///     fn schema() -> Result<Arc<TableSchema>, SchemaError> {
///         USER.get_or_bind(|| {
///             TableSchema::builder("User")
///                 .table("users")
///                 .field("id", Field::integer().primary_key())
///                 .field("name", Field::string())
///                 .bind()
///         })
///     }
///
///     fn from_record(record: &Record) -> Result<Self, ValueError> {
///         Ok(User {
///             id: record.get_as("id")?,
///             name: record.get_as("name")?,
///         })
///     }
///
///     fn to_record(&self, schema: Arc<TableSchema>) -> Record {
///         Record::new(schema).with("id", self.id).with("name", self.name.as_str())
///     }
/// }
///
/// # async fn run(pool: &Pool) -> Result<(), SqlModelError> {
/// let mut user = User { id: 42, name: "a".into() };
/// user.save(pool).await?;
/// let found = User::find_by_key(pool, 42.into()).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Model: Sized + Send + Sync {
    /// The bound schema; implementations cache it in a [`SchemaCell`](crate::SchemaCell).
    ///
    /// # Errors
    ///
    /// The binding error, every time, when the declarations are invalid.
    fn schema() -> Result<Arc<TableSchema>, SchemaError>;

    /// # Errors
    ///
    /// Missing or mistyped columns.
    fn from_record(record: &Record) -> Result<Self, ValueError>;

    fn to_record(&self, schema: Arc<TableSchema>) -> Record;

    async fn find_by_key(pool: &Pool, key: RowValues) -> Result<Option<Self>, SqlModelError> {
        let schema = Self::schema()?;
        match schema.find_by_key(pool, key).await? {
            Some(record) => Ok(Some(Self::from_record(&record)?)),
            None => Ok(None),
        }
    }

    async fn find_all(pool: &Pool, options: &FindOptions) -> Result<Vec<Self>, SqlModelError> {
        let records = Self::schema()?.find_all(pool, options).await?;
        from_records(&records)
    }

    async fn find_all_by(
        pool: &Pool,
        pairs: &[(&str, RowValues)],
    ) -> Result<Vec<Self>, SqlModelError> {
        let records = Self::schema()?.find_all_by(pool, pairs).await?;
        from_records(&records)
    }

    async fn count(
        pool: &Pool,
        expression: &str,
        where_clause: Option<&str>,
        args: &[RowValues],
    ) -> Result<Option<RowValues>, SqlModelError> {
        Self::schema()?
            .count(pool, expression, where_clause, args)
            .await
    }

    /// Insert; materialized defaults are written back into `self`.
    ///
    /// Once the insert has run, a record that cannot be read back into `Self` is logged
    /// and `self` is left as it was; the affected-row count is still returned.
    async fn save(&mut self, pool: &Pool) -> Result<usize, SqlModelError> {
        let schema = Self::schema()?;
        let mut record = self.to_record(Arc::clone(&schema));
        let rows = record.save(pool).await?;
        match Self::from_record(&record) {
            Ok(saved) => *self = saved,
            Err(err) => warn!(
                table = schema.table_name(),
                error = %err,
                "saved record could not be read back"
            ),
        }
        Ok(rows)
    }

    async fn update(&self, pool: &Pool) -> Result<usize, SqlModelError> {
        self.to_record(Self::schema()?).update(pool).await
    }

    async fn delete(&self, pool: &Pool) -> Result<usize, SqlModelError> {
        self.to_record(Self::schema()?).delete(pool).await
    }
}

fn from_records<M: Model>(records: &[Record]) -> Result<Vec<M>, SqlModelError> {
    records
        .iter()
        .map(|r| M::from_record(r).map_err(SqlModelError::from))
        .collect()
}
