use std::fmt;
use std::sync::Arc;

use crate::types::RowValues;

/// Storage type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Bounded string, carries its width.
    Varchar(u32),
    Int,
    Float,
    Text,
    Boolean,
}

impl ColumnType {
    /// The DDL spelling of this type.
    #[must_use]
    pub fn ddl(&self) -> String {
        match self {
            ColumnType::Varchar(width) => format!("varchar({width})"),
            ColumnType::Int => "int".to_string(),
            ColumnType::Float => "float".to_string(),
            ColumnType::Text => "text".to_string(),
            ColumnType::Boolean => "boolean".to_string(),
        }
    }

    /// Normalize a value read back from a driver to this column's declared type.
    ///
    /// Drivers without a native boolean hand back `0`/`1`, and integral floats may come
    /// back as integers; anything else passes through untouched.
    #[must_use]
    pub fn coerce(&self, value: RowValues) -> RowValues {
        match (self, value) {
            (ColumnType::Boolean, RowValues::Int(i)) if i == 0 || i == 1 => RowValues::Bool(i == 1),
            #[allow(clippy::cast_precision_loss)]
            (ColumnType::Float, RowValues::Int(i)) => RowValues::Float(i as f64),
            (_, other) => other,
        }
    }
}

/// Zero-argument value producer used as a lazily evaluated default.
pub type DefaultProducer = Arc<dyn Fn() -> RowValues + Send + Sync>;

/// Default for a non-key column, applied by `save()` when the record has no value.
#[derive(Clone)]
pub enum FieldDefault {
    Value(RowValues),
    Producer(DefaultProducer),
}

impl FieldDefault {
    /// Produce the concrete value, calling the producer if there is one.
    #[must_use]
    pub fn materialize(&self) -> RowValues {
        match self {
            FieldDefault::Value(v) => v.clone(),
            FieldDefault::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Producer(_) => f.write_str("Producer(<fn>)"),
        }
    }
}

/// Immutable description of one mapped column.
///
/// ```rust
/// use sql_model::prelude::*;
///
/// let id = Field::string().primary_key();
/// let created_at = Field::float().default_with(|| RowValues::Float(0.5));
/// assert!(id.is_primary_key());
/// assert_eq!(created_at.default_value(), Some(RowValues::Float(0.5)));
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    column_type: ColumnType,
    primary_key: bool,
    default: Option<FieldDefault>,
}

impl Field {
    #[must_use]
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            name: None,
            column_type,
            primary_key: false,
            default: None,
        }
    }

    /// `varchar(100)` column without a default.
    #[must_use]
    pub fn string() -> Self {
        Self::varchar(100)
    }

    #[must_use]
    pub fn varchar(width: u32) -> Self {
        Self::new(ColumnType::Varchar(width))
    }

    /// Integer column defaulting to `0`.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(ColumnType::Int).with_default(0_i64)
    }

    /// Float column defaulting to `0.0`.
    #[must_use]
    pub fn float() -> Self {
        Self::new(ColumnType::Float).with_default(0.0_f64)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new(ColumnType::Boolean)
    }

    #[must_use]
    pub fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    /// Use `column` as the column name instead of the declaring attribute name.
    #[must_use]
    pub fn named(mut self, column: impl Into<String>) -> Self {
        self.name = Some(column.into());
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<RowValues>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Default computed on every use, e.g. a timestamp or generated id.
    #[must_use]
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> RowValues + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Producer(Arc::new(producer)));
        self
    }

    #[must_use]
    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[must_use]
    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// Materialized default; always `None` for key fields, whose values must be supplied.
    #[must_use]
    pub fn default_value(&self) -> Option<RowValues> {
        if self.primary_key {
            return None;
        }
        self.default.as_ref().map(FieldDefault::materialize)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Field, {}:{}>",
            self.column_type.ddl(),
            self.name.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_constructors_carry_their_defaults() {
        assert_eq!(Field::integer().default_value(), Some(RowValues::Int(0)));
        assert_eq!(Field::float().default_value(), Some(RowValues::Float(0.0)));
        assert_eq!(Field::string().default_value(), None);
        assert_eq!(Field::string().column_type(), ColumnType::Varchar(100));
    }

    #[test]
    fn key_fields_ignore_defaults() {
        let field = Field::integer().primary_key();
        assert!(field.default().is_some());
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn producer_runs_on_every_materialization() {
        use std::sync::atomic::{AtomicI64, Ordering};
        let counter = Arc::new(AtomicI64::new(0));
        let c = Arc::clone(&counter);
        let field = Field::integer().default_with(move || RowValues::Int(c.fetch_add(1, Ordering::SeqCst)));
        assert_eq!(field.default_value(), Some(RowValues::Int(0)));
        assert_eq!(field.default_value(), Some(RowValues::Int(1)));
    }

    #[test]
    fn display_shows_ddl_and_name() {
        assert_eq!(Field::string().named("email").to_string(), "<Field, varchar(100):email>");
        assert_eq!(Field::boolean().to_string(), "<Field, boolean:>");
    }

    #[test]
    fn coerce_restores_declared_types() {
        assert_eq!(ColumnType::Boolean.coerce(RowValues::Int(1)), RowValues::Bool(true));
        assert_eq!(ColumnType::Float.coerce(RowValues::Int(3)), RowValues::Float(3.0));
        assert_eq!(ColumnType::Int.coerce(RowValues::Int(3)), RowValues::Int(3));
        assert_eq!(ColumnType::Boolean.coerce(RowValues::Int(5)), RowValues::Int(5));
    }
}
