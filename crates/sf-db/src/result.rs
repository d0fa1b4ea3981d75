//! Query results keyed by column name

use std::sync::Arc;

/// Rows returned by one statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names in result order
    pub columns: Arc<[String]>,
    /// Result rows
    pub rows: Vec<Row>,
}

/// A single result row; cells are kept as the text the platform returned
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Default for QueryResult {
    fn default() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
        }
    }
}

impl QueryResult {
    /// An empty result with no columns, as returned by most DDL
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result from column names and row values.
    ///
    /// Rows shorter than the column list are padded with NULLs.
    pub fn new<C, S>(columns: C, rows: Vec<Vec<Option<String>>>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|mut values| {
                values.resize(columns.len(), None);
                Row {
                    columns: Arc::clone(&columns),
                    values,
                }
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor for results without NULLs
    pub fn from_strings(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().copied(),
            rows.iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        )
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row, if any
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// First cell of the first row, as returned by `select current_role()`
    pub fn scalar(&self) -> Option<&str> {
        self.first().and_then(|row| row.at(0))
    }
}

impl Row {
    /// Value of a column, matched case-insensitively. NULL and unknown columns yield `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))?;
        self.at(idx)
    }

    /// Value at a column index
    pub fn at(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    /// Column names of this row
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Iterate over `(column, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(|v| v.as_deref()))
    }
}
