use std::sync::Arc;

use crate::types::RowValues;

/// A row from a database query result
///
/// Column names are shared by every row of the same result, so a large select only
/// stores them once.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, positionally aligned with `column_names`
    pub rows: Vec<RowValues>,
}

impl CustomDbRow {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `rows` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        Self { column_names, rows }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    ///
    /// Returns `None` if the column wasn't found.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Consume the row into `(column, value)` pairs.
    pub fn into_pairs(self) -> impl Iterator<Item = (String, RowValues)> {
        let names = self.column_names;
        self.rows
            .into_iter()
            .enumerate()
            .filter_map(move |(idx, value)| names.get(idx).map(|name| (name.clone(), value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_index() {
        let names = Arc::new(vec!["id".to_string(), "name".to_string()]);
        let row = CustomDbRow::new(names, vec![RowValues::Int(1), RowValues::Text("a".into())]);
        assert_eq!(row.get("name"), Some(&RowValues::Text("a".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_by_index(0), Some(&RowValues::Int(1)));
        let pairs: Vec<_> = row.into_pairs().collect();
        assert_eq!(pairs[1], ("name".to_string(), RowValues::Text("a".into())));
    }
}
