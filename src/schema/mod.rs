//! Schema binding: field declarations in, immutable table metadata and SQL templates out.

use std::collections::HashMap;

use tracing::debug;

use crate::error::SchemaError;
use crate::field::Field;

mod cell;
pub mod sql;

pub use cell::SchemaCell;

/// Bound table metadata and the four canonical statements of one record type.
///
/// Built once by [`bind`] (or [`SchemaBuilder::bind`]) and never modified afterwards.
#[derive(Debug, Clone)]
pub struct TableSchema {
    model_name: String,
    table_name: String,
    primary_key: String,
    fields: Vec<String>,
    mappings: HashMap<String, Field>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl TableSchema {
    /// Start declaring the schema of the record type called `model_name`.
    #[must_use]
    pub fn builder(model_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model_name: model_name.into(),
            table_name: None,
            declarations: Vec::new(),
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Column name of the primary key.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key column names in declaration order; the parameter order of every template.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Descriptor for a column (key or non-key).
    #[must_use]
    pub fn field(&self, column: &str) -> Option<&Field> {
        self.mappings.get(column)
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.mappings.contains_key(column)
    }

    /// `select <pk>,<fields...> from <table>`, without a where clause.
    #[must_use]
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    #[must_use]
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    #[must_use]
    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    #[must_use]
    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

/// Fluent collection of field declarations, consumed by [`SchemaBuilder::bind`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    model_name: String,
    table_name: Option<String>,
    declarations: Vec<(String, Field)>,
}

impl SchemaBuilder {
    /// Map to `table` instead of the model name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    /// Declare attribute `attribute`; declaration order is kept.
    #[must_use]
    pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
        self.declarations.push((attribute.into(), field));
        self
    }

    /// Bind the declarations.
    ///
    /// # Errors
    ///
    /// See [`bind`].
    pub fn bind(self) -> Result<TableSchema, SchemaError> {
        bind(&self.model_name, self.table_name.as_deref(), self.declarations)
    }
}

/// Turn ordered field declarations into a [`TableSchema`].
///
/// The column name of each field is its explicit name, falling back to the attribute
/// name. The table name is `table_override`, falling back to `model_name`.
///
/// # Errors
///
/// * `SchemaError::MissingPrimaryKey` when no field is a primary key.
/// * `SchemaError::DuplicatePrimaryKey` naming the second key field when there are several.
/// * `SchemaError::DuplicateField` when two declarations map to the same column.
pub fn bind(
    model_name: &str,
    table_override: Option<&str>,
    declarations: Vec<(String, Field)>,
) -> Result<TableSchema, SchemaError> {
    let table_name = table_override.unwrap_or(model_name).to_string();
    debug!(model = model_name, table = %table_name, "found model");

    let mut mappings = HashMap::with_capacity(declarations.len());
    let mut fields = Vec::new();
    let mut primary_key: Option<String> = None;

    for (attribute, field) in declarations {
        let column = field.name().unwrap_or(attribute.as_str()).to_string();
        debug!(attribute = %attribute, field = %field, "found mapping");
        if field.is_primary_key() {
            if primary_key.is_some() {
                return Err(SchemaError::DuplicatePrimaryKey { field: column });
            }
            debug!(column = %column, "found primary key");
            primary_key = Some(column.clone());
        } else {
            fields.push(column.clone());
        }
        if mappings.insert(column.clone(), field).is_some() {
            return Err(SchemaError::DuplicateField { field: column });
        }
    }

    let Some(primary_key) = primary_key else {
        return Err(SchemaError::MissingPrimaryKey {
            model: model_name.to_string(),
        });
    };

    Ok(TableSchema {
        model_name: model_name.to_string(),
        select_sql: sql::select_template(&table_name, &primary_key, &fields),
        insert_sql: sql::insert_template(&table_name, &primary_key, &fields),
        update_sql: sql::update_template(&table_name, &primary_key, &fields),
        delete_sql: sql::delete_template(&table_name, &primary_key),
        table_name,
        primary_key,
        fields,
        mappings,
    })
}
