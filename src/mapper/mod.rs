//! Result rows to caller-defined records.
//!
//! A record type describes its fields once (see [`Record`]); per query the mapper builds the
//! column-to-field map, binds every result column to a coercion function, then fills one fresh
//! record per row.

mod coerce;
mod record;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

pub use coerce::CoerceError;
pub use record::{ColumnBinding, ColumnValue, FieldKind, FieldSetter, FieldSpec, FieldValue, Record};

use coerce::{Coercion, coercion_for};
use record::describe;

use crate::connection::RowCursor;
use crate::error::{DbError, Reason};

/// Result-column name to field position, for one record type.
pub(crate) struct FieldMap<T> {
    specs: Arc<Vec<FieldSpec<T>>>,
    by_column: HashMap<String, usize>,
}

impl<T: Record> FieldMap<T> {
    /// # Errors
    /// [`Reason::NoFieldRelations`] when no field of `T` binds to a column.
    pub(crate) fn build() -> Result<Self, DbError> {
        let specs = describe::<T>();
        let by_column: HashMap<String, usize> = specs
            .iter()
            .enumerate()
            .filter_map(|(idx, spec)| spec.column_name().map(|name| (name, idx)))
            .collect();
        if by_column.is_empty() {
            return Err(DbError::from_reason(Reason::NoFieldRelations));
        }
        Ok(Self { specs, by_column })
    }

    /// Match every result column to a field and pick its coercion.
    fn bind(&self, columns: &[String]) -> Result<Vec<ColumnSlot<T>>, DbError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|name| !self.by_column.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DbError::missing_columns_error(missing));
        }

        columns
            .iter()
            .map(|name| {
                let spec = &self.specs[self.by_column[name.as_str()]];
                match spec.kind {
                    FieldKind::Record => Err(DbError::from_reason(Reason::NestedRecord)),
                    kind => coercion_for(kind)
                        .map(|coerce| ColumnSlot {
                            column: name.clone(),
                            setter: spec.setter,
                            coerce,
                        })
                        .ok_or_else(|| DbError::from_reason(Reason::UnsupportedFieldType)),
                }
            })
            .collect()
    }
}

struct ColumnSlot<T> {
    column: String,
    setter: FieldSetter<T>,
    coerce: Coercion,
}

/// Read every row of `cursor` into records of type `T`, appended to `dest`.
///
/// Nothing is appended unless every row maps cleanly.
///
/// # Errors
/// * [`Reason::MissingColumns`] listing every column with no matching field.
/// * [`Reason::NestedRecord`] / [`Reason::UnsupportedFieldType`] for fields the mapper refuses.
/// * [`Reason::RowScanFailed`] if the cursor fails, [`Reason::FieldAssignmentFailed`] if a value
///   cannot be coerced into its field.
pub(crate) fn map_rows<T: Record>(
    map: &FieldMap<T>,
    cursor: &mut dyn RowCursor,
    dest: &mut Vec<T>,
) -> Result<usize, DbError> {
    let slots = map.bind(cursor.columns())?;
    let mut records = Vec::new();

    loop {
        let row = match cursor.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(err) => return Err(DbError::from_reason(Reason::RowScanFailed).with_origin(err)),
        };
        if row.len() != slots.len() {
            return Err(DbError::from_reason(Reason::RowScanFailed).with_origin(format!(
                "row has {} values for {} columns",
                row.len(),
                slots.len()
            )));
        }

        let mut record = T::default();
        for (slot, raw) in slots.iter().zip(&row) {
            let value = (slot.coerce)(raw)
                .map_err(|cause| DbError::field_assignment_error(&slot.column, cause))?;
            (slot.setter)(&mut record, value).map_err(|value| {
                DbError::field_assignment_error(
                    &slot.column,
                    format!("{value:?} does not fit the field"),
                )
            })?;
        }
        records.push(record);
    }

    let count = records.len();
    trace!(rows = count, "mapped result rows");
    dest.extend(records);
    Ok(count)
}
