use std::collections::HashMap;
use std::sync::Arc;

use super::row::{FetchedRow, index_columns};
use crate::connection::RowCursor;
use crate::error::DriverError;
use crate::types::RowValues;

/// Rows returned by [`crate::SelectBuilder::fetch`], in cursor order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub results: Vec<FetchedRow>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            results: Vec::new(),
            column_names: Arc::new(column_names),
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        self.results
            .push(FetchedRow::shared(&self.column_names, &self.column_index, values));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drain any cursor into a result set.
    ///
    /// # Errors
    /// Returns the cursor's [`DriverError`] if a row cannot be read.
    pub fn collect_from(cursor: &mut dyn RowCursor) -> Result<Self, DriverError> {
        let mut set = Self::new(cursor.columns().to_vec());
        while let Some(values) = cursor.next_row()? {
            set.add_row_values(values);
        }
        Ok(set)
    }
}
