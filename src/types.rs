use std::fmt;

use crate::error::ValueError;

/// Values that can be stored in a database row or used as statement parameters.
///
/// The same enum is used by every backend, so record code never branches on driver types:
/// ```rust
/// use sql_model::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "int",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "bool",
            RowValues::Null => "null",
            RowValues::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValues::Int(i) => write!(f, "{i}"),
            RowValues::Float(v) => write!(f, "{v}"),
            RowValues::Text(s) => write!(f, "{s}"),
            RowValues::Bool(b) => write!(f, "{b}"),
            RowValues::Null => f.write_str("NULL"),
            RowValues::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Typed extraction of a column value.
///
/// ```rust
/// use sql_model::prelude::*;
///
/// let name = String::from_row_value("name", &RowValues::Text("a".into())).unwrap();
/// assert_eq!(name, "a");
/// ```
pub trait FromRowValue: Sized {
    /// Convert `value`, read from `column`, into `Self`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` when the value has an incompatible variant.
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError>;
}

fn mismatch(column: &str, expected: &'static str, value: &RowValues) -> ValueError {
    ValueError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: value.kind().to_string(),
    }
}

impl FromRowValue for i64 {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_int()
            .copied()
            .ok_or_else(|| mismatch(column, "int", value))
    }
}

impl FromRowValue for i32 {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_int()
            .and_then(|i| i32::try_from(*i).ok())
            .ok_or_else(|| mismatch(column, "int", value))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_float()
            .ok_or_else(|| mismatch(column, "float", value))
    }
}

impl FromRowValue for bool {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_bool()
            .copied()
            .ok_or_else(|| mismatch(column, "bool", value))
    }
}

impl FromRowValue for String {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        value
            .as_blob()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch(column, "blob", value))
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, ValueError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(column, value).map(Some)
        }
    }
}
