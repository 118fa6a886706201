use std::collections::HashMap;
use std::sync::Arc;

use super::row::FromDbValue;
use crate::error::SqlConduitError;
use crate::types::DbValue;

/// A materialized row of a [`ResultSet`].
///
/// Column names and the name lookup table are shared by every row of the same result.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<DbValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl TableRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<DbValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Value of a column by name, or `None` if the column wasn't found.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    /// Typed read with the same NULL-as-zero rule as the live row adapter.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column and `TypeMismatch` if coercion fails.
    pub fn get_as<T: FromDbValue>(&self, column_name: &str) -> Result<T, SqlConduitError> {
        let value = self
            .get(column_name)
            .ok_or_else(|| SqlConduitError::ColumnNotFound(column_name.to_string()))?;
        T::from_nullable(value)
    }
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    // Later duplicates must not shadow the first column with a given name.
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}

/// One bulk-filled result table.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the command
    pub results: Vec<TableRow>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
            column_index: None,
        }
    }

    /// Set the column names shared by all rows added afterwards.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row; ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<DbValue>) {
        if let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        {
            self.results.push(TableRow {
                column_names: Arc::clone(column_names),
                values: row_values,
                column_index: Arc::clone(column_index),
            });
        }
    }

    /// Add a prebuilt row, adopting its column names if none are set yet.
    pub fn add_row(&mut self, row: TableRow) {
        if self.column_names.is_none() {
            self.column_names = Some(Arc::clone(&row.column_names));
            self.column_index = Some(Arc::clone(&row.column_index));
        }
        self.results.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Every result a command produced, in order.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    tables: Vec<ResultSet>,
}

impl DataSet {
    pub fn push(&mut self, table: ResultSet) {
        self.tables.push(table);
    }

    #[must_use]
    pub fn tables(&self) -> &[ResultSet] {
        &self.tables
    }

    #[must_use]
    pub fn table(&self, index: usize) -> Option<&ResultSet> {
        self.tables.get(index)
    }

    #[must_use]
    pub fn into_tables(self) -> Vec<ResultSet> {
        self.tables
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Caller-defined typed view built from a filled [`DataSet`].
pub trait FromDataSet: Sized {
    /// # Errors
    /// Implementations return an error when the data set does not have the expected shape.
    fn from_data_set(data_set: DataSet) -> Result<Self, SqlConduitError>;
}

impl FromDataSet for DataSet {
    fn from_data_set(data_set: DataSet) -> Result<Self, SqlConduitError> {
        Ok(data_set)
    }
}

impl FromDataSet for ResultSet {
    fn from_data_set(data_set: DataSet) -> Result<Self, SqlConduitError> {
        Ok(data_set.into_tables().into_iter().next().unwrap_or_default())
    }
}

impl FromDataSet for Vec<ResultSet> {
    fn from_data_set(data_set: DataSet) -> Result<Self, SqlConduitError> {
        Ok(data_set.into_tables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultSet {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["id".into(), "note".into()]));
        rs.add_row_values(vec![DbValue::Int(1), DbValue::Text("a".into())]);
        rs.add_row_values(vec![DbValue::Int(2), DbValue::Null]);
        rs
    }

    #[test]
    fn rows_share_columns() {
        let rs = table();
        assert_eq!(rs.len(), 2);
        assert!(Arc::ptr_eq(&rs.results[0].column_names, &rs.results[1].column_names));
        assert_eq!(rs.results[1].get("id"), Some(&DbValue::Int(2)));
        assert_eq!(rs.results[1].get_as::<String>("note").unwrap(), "");
    }

    #[test]
    fn rows_before_columns_are_dropped() {
        let mut rs = ResultSet::default();
        rs.add_row_values(vec![DbValue::Int(1)]);
        assert!(rs.is_empty());
        rs.add_row(TableRow::new(Arc::new(vec!["x".into()]), vec![DbValue::Int(5)]));
        assert_eq!(rs.get_column_names().map(|c| c.len()), Some(1));
    }

    #[test]
    fn data_set_conversions() {
        let mut ds = DataSet::default();
        ds.push(table());
        ds.push(ResultSet::default());
        assert_eq!(ds.len(), 2);
        let first = ResultSet::from_data_set(ds.clone()).unwrap();
        assert_eq!(first.len(), 2);
        let all = Vec::<ResultSet>::from_data_set(ds).unwrap();
        assert_eq!(all.len(), 2);
    }
}
