use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{SqlModelError, ValueError};
use crate::executor;
use crate::pool::Pool;
use crate::results::CustomDbRow;
use crate::schema::TableSchema;
use crate::types::{FromRowValue, RowValues};

/// One row of a bound table, held as a column-name → value map.
///
/// A record has no identity beyond its values; two records of the same table with the
/// same values are equal.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    values: HashMap<String, RowValues>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.table_name() == other.schema.table_name() && self.values == other.values
    }
}

impl Record {
    #[must_use]
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
        }
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.set(column, value);
        self
    }

    /// Build a record from a query row, coercing each mapped column to its declared type.
    #[must_use]
    pub fn from_row(schema: Arc<TableSchema>, row: CustomDbRow) -> Self {
        let values = row
            .into_pairs()
            .map(|(column, value)| {
                let value = match schema.field(&column) {
                    Some(field) => field.column_type().coerce(value),
                    None => value,
                };
                (column, value)
            })
            .collect();
        Self { schema, values }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<RowValues>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<RowValues> {
        self.values.remove(column)
    }

    /// Value of `column`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NoSuchAttribute` when the record holds no value for `column`.
    pub fn get(&self, column: &str) -> Result<&RowValues, ValueError> {
        self.values
            .get(column)
            .ok_or_else(|| ValueError::NoSuchAttribute(column.to_string()))
    }

    /// Value of `column`, or `None` when absent.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&RowValues> {
        self.values.get(column)
    }

    /// Typed value of `column`.
    ///
    /// # Errors
    ///
    /// `ValueError::NoSuchAttribute` when absent, `ValueError::TypeMismatch` when the
    /// stored value cannot be converted to `T`.
    pub fn get_as<T: FromRowValue>(&self, column: &str) -> Result<T, ValueError> {
        T::from_row_value(column, self.get(column)?)
    }

    /// Value of `column`, falling back to the field's default when absent or NULL.
    ///
    /// A materialized default is stored in the record, so it is only produced once.
    /// Columns without a value and without a default yield `RowValues::Null`.
    pub fn get_or_default(&mut self, column: &str) -> RowValues {
        if let Some(value) = self.values.get(column)
            && !value.is_null()
        {
            return value.clone();
        }
        let Some(default) = self.schema.field(column).and_then(|f| f.default_value()) else {
            return RowValues::Null;
        };
        debug!(column, value = %default, "using default value");
        self.values.insert(column.to_string(), default.clone());
        default
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn key_value(&self) -> Result<RowValues, ValueError> {
        self.get(self.schema.primary_key()).cloned()
    }

    /// Insert this record.
    ///
    /// Parameters are the non-key columns in schema order followed by the primary key,
    /// which must be set. Every column sent is written back into the record, so after
    /// the insert it holds materialized defaults and explicit NULLs for the columns it
    /// was missing. An affected-row count other than 1 is logged, not raised.
    ///
    /// # Errors
    ///
    /// `ValueError::NoSuchAttribute` if the key is unset; pool and driver errors.
    pub async fn save(&mut self, pool: &Pool) -> Result<usize, SqlModelError> {
        let key = self.key_value()?;
        let schema = Arc::clone(&self.schema);
        let mut args: Vec<RowValues> = schema
            .fields()
            .iter()
            .map(|column| {
                let value = self.get_or_default(column);
                self.values
                    .entry(column.to_string())
                    .or_insert_with(|| value.clone());
                value
            })
            .collect();
        args.push(key);
        let rows = executor::execute(pool, schema.insert_sql(), &args).await?;
        if rows != 1 {
            warn!(table = schema.table_name(), affected = rows, "failed to insert record");
        }
        Ok(rows)
    }

    /// Update the non-key columns of the row with this record's key.
    ///
    /// Absent columns are written as NULL; defaults are not applied.
    ///
    /// # Errors
    ///
    /// `ValueError::NoSuchAttribute` if the key is unset; pool and driver errors.
    pub async fn update(&self, pool: &Pool) -> Result<usize, SqlModelError> {
        let mut args: Vec<RowValues> = self
            .schema
            .fields()
            .iter()
            .map(|column| self.value(column).cloned().unwrap_or(RowValues::Null))
            .collect();
        args.push(self.key_value()?);
        let rows = executor::execute(pool, self.schema.update_sql(), &args).await?;
        if rows != 1 {
            warn!(table = self.schema.table_name(), affected = rows, "failed to update record");
        }
        Ok(rows)
    }

    /// Delete the row with this record's key.
    ///
    /// # Errors
    ///
    /// `ValueError::NoSuchAttribute` if the key is unset; pool and driver errors.
    pub async fn delete(&self, pool: &Pool) -> Result<usize, SqlModelError> {
        let args = [self.key_value()?];
        let rows = executor::execute(pool, self.schema.delete_sql(), &args).await?;
        if rows != 1 {
            warn!(
                table = self.schema.table_name(),
                affected = rows,
                "failed to delete by primary key"
            );
        }
        Ok(rows)
    }
}
