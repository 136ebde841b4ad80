//! Query text for the find family, built on top of a schema's select template.
//!
//! Clauses are appended in the fixed order WHERE → ORDER BY → LIMIT, and arguments are
//! collected in the same order so they line up with the placeholders.

use crate::error::ValueError;
use crate::schema::TableSchema;
use crate::schema::sql::{PLACEHOLDER, quote_ident};
use crate::types::RowValues;

/// Row limit of a `find_all` query. Both numbers are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `limit ?`
    Count(i64),
    /// `limit ?,?`, arguments in (offset, count) order.
    Range { offset: i64, count: i64 },
}

impl Limit {
    /// Interpret loosely typed limit arguments: one count, or an (offset, count) pair.
    ///
    /// # Errors
    ///
    /// `ValueError::InvalidLimit` for any other shape, a non-integer, or a negative value.
    pub fn parse(values: &[RowValues]) -> Result<Self, ValueError> {
        let invalid = || ValueError::InvalidLimit(format!("{values:?}"));
        let non_negative = |v: &RowValues| {
            v.as_int()
                .copied()
                .filter(|n| *n >= 0)
                .ok_or_else(invalid)
        };
        match values {
            [count] => Ok(Limit::Count(non_negative(count)?)),
            [offset, count] => Ok(Limit::Range {
                offset: non_negative(offset)?,
                count: non_negative(count)?,
            }),
            _ => Err(invalid()),
        }
    }

    fn clause(self) -> String {
        match self {
            Limit::Count(_) => format!("limit {PLACEHOLDER}"),
            Limit::Range { .. } => format!("limit {PLACEHOLDER},{PLACEHOLDER}"),
        }
    }

    fn args(self) -> Vec<RowValues> {
        match self {
            Limit::Count(count) => vec![RowValues::Int(count)],
            Limit::Range { offset, count } => vec![RowValues::Int(offset), RowValues::Int(count)],
        }
    }
}

/// Optional clauses of a `find_all` call.
///
/// ```rust
/// use sql_model::prelude::*;
///
/// let opts = FindOptions::new()
///     .filter("`admin`=?", vec![RowValues::Bool(true)])
///     .order_by("`created_at` desc")
///     .limit_range(10, 5);
/// assert_eq!(opts.args().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    where_clause: Option<String>,
    args: Vec<RowValues>,
    order_by: Option<String>,
    limit: Option<Vec<RowValues>>,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw where clause (without the `where` keyword) and its arguments.
    #[must_use]
    pub fn filter(mut self, clause: impl Into<String>, args: Vec<RowValues>) -> Self {
        self.where_clause = Some(clause.into());
        self.args = args;
        self
    }

    /// Raw order-by clause (without the `order by` keywords).
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// `limit ?`; a negative count is rejected when the statement is built.
    #[must_use]
    pub fn limit(self, count: i64) -> Self {
        self.limit_values(vec![RowValues::Int(count)])
    }

    /// `limit ?,?`; negative values are rejected when the statement is built.
    #[must_use]
    pub fn limit_range(self, offset: i64, count: i64) -> Self {
        self.limit_values(vec![RowValues::Int(offset), RowValues::Int(count)])
    }

    /// Limit given as loose values; validated when the statement is built.
    #[must_use]
    pub fn limit_values(mut self, values: Vec<RowValues>) -> Self {
        self.limit = Some(values);
        self
    }

    #[must_use]
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Arguments of the where clause.
    #[must_use]
    pub fn args(&self) -> &[RowValues] {
        &self.args
    }
}

/// SQL text plus the arguments for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<RowValues>,
}

/// `<select> where <pk>=?`
#[must_use]
pub fn find_by_key(schema: &TableSchema, key: RowValues) -> Statement {
    Statement {
        sql: format!(
            "{} where {}={PLACEHOLDER}",
            schema.select_sql(),
            quote_ident(schema.primary_key())
        ),
        args: vec![key],
    }
}

/// `<select> [where ...] [order by ...] [limit ?[,?]]`
///
/// # Errors
///
/// `ValueError::InvalidLimit` when the limit has the wrong shape.
pub fn find_all(schema: &TableSchema, options: &FindOptions) -> Result<Statement, ValueError> {
    let mut sql = vec![schema.select_sql().to_string()];
    let mut args = Vec::new();
    if let Some(clause) = &options.where_clause {
        sql.push("where".to_string());
        sql.push(clause.clone());
        args.extend(options.args.iter().cloned());
    }
    if let Some(order_by) = &options.order_by {
        sql.push("order by".to_string());
        sql.push(order_by.clone());
    }
    if let Some(values) = &options.limit {
        let limit = Limit::parse(values)?;
        sql.push(limit.clause());
        args.extend(limit.args());
    }
    Ok(Statement {
        sql: sql.join(" "),
        args,
    })
}

/// `<select> where `c1`=? and `c2`=? ...`, one predicate per pair in the order given.
///
/// # Errors
///
/// `ValueError::UnknownColumn` when a column is not part of the schema.
pub fn find_all_by_equality(
    schema: &TableSchema,
    pairs: &[(&str, RowValues)],
) -> Result<Statement, ValueError> {
    if pairs.is_empty() {
        return Ok(Statement {
            sql: schema.select_sql().to_string(),
            args: Vec::new(),
        });
    }
    let mut predicates = Vec::with_capacity(pairs.len());
    let mut args = Vec::with_capacity(pairs.len());
    for (column, value) in pairs {
        if !schema.has_column(column) {
            return Err(ValueError::UnknownColumn {
                table: schema.table_name().to_string(),
                column: (*column).to_string(),
            });
        }
        predicates.push(format!("{}={PLACEHOLDER}", quote_ident(column)));
        args.push(value.clone());
    }
    Ok(Statement {
        sql: format!("{} where {}", schema.select_sql(), predicates.join(" and ")),
        args,
    })
}

/// Column alias the count query reads its result from.
pub const COUNT_ALIAS: &str = "__num__";

/// `select <expression> __num__ from `T` [where ...]`
#[must_use]
pub fn count(
    schema: &TableSchema,
    expression: &str,
    where_clause: Option<&str>,
    args: &[RowValues],
) -> Statement {
    let mut sql = format!(
        "select {expression} {COUNT_ALIAS} from {}",
        quote_ident(schema.table_name())
    );
    if let Some(clause) = where_clause {
        sql.push_str(" where ");
        sql.push_str(clause);
    }
    Statement {
        sql,
        args: args.to_vec(),
    }
}
