use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// One unmapped result row. Column names and their index are shared with the whole
/// [`super::ResultSet`].
#[derive(Debug, Clone)]
pub struct FetchedRow {
    columns: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
    pub values: Vec<RowValues>,
}

impl FetchedRow {
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let index = Arc::new(index_columns(&columns));
        Self {
            columns,
            index,
            values,
        }
    }

    pub(crate) fn shared(
        columns: &Arc<Vec<String>>,
        index: &Arc<HashMap<String, usize>>,
        values: Vec<RowValues>,
    ) -> Self {
        Self {
            columns: Arc::clone(columns),
            index: Arc::clone(index),
            values,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Value of `column`, or `None` if the result has no such column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.position(column).and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }
}

/// Column name to position. A repeated name resolves to its first occurrence.
pub(crate) fn index_columns(columns: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}
