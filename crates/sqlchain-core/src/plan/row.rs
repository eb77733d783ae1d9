use crate::{error::InternalError, traits::FromValue, value::Value};
use std::sync::Arc;

///
/// Row
///
/// One result row as produced by a `Cursor`. Column names are shared by
/// every row of one result set.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row; `values` must be in `columns` order.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Result<Self, InternalError> {
        if columns.len() != values.len() {
            return Err(InternalError::connection(format!(
                "row carries {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, values })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the column at `index`, or `""` when out of range.
    #[must_use]
    pub fn column_name(&self, index: usize) -> &str {
        self.columns.get(index).map_or("", String::as_str)
    }

    /// Value of a column by member name.
    pub fn get(&self, name: &str) -> Result<&Value, InternalError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .map(|index| &self.values[index])
            .ok_or_else(|| InternalError::missing_column(name))
    }

    /// Typed value of a column by member name.
    pub fn read<T: FromValue>(&self, name: &str) -> Result<T, InternalError> {
        T::from_value(self.get(name)?)
            .ok_or_else(|| InternalError::mapping_mismatch(name, T::EXPECTED))
    }

    /// The only value of a single-column row.
    pub fn scalar(&self) -> Result<&Value, InternalError> {
        match self.values.as_slice() {
            [value] => Ok(value),
            _ => Err(InternalError::mapping_mismatch(
                self.column_name(0),
                "a single-column result",
            )),
        }
    }

    /// Typed value of a single-column row.
    pub fn scalar_as<T: FromValue>(&self) -> Result<T, InternalError> {
        T::from_value(self.scalar()?)
            .ok_or_else(|| InternalError::mapping_mismatch(self.column_name(0), T::EXPECTED))
    }
}
