use serde_json::Value;

use crate::{error::MaterializationError, value::DbValue};

/// Forward-only access to the rows of one executed command.
pub trait RowCursor {
    /// Advances to the next row; false once the rows are exhausted.
    fn move_next(&mut self) -> Result<bool, MaterializationError>;

    fn field_count(&self) -> usize;

    fn name_at(&self, index: usize) -> Option<&str>;

    fn is_null(&self, index: usize) -> bool;

    fn get_value(&self, index: usize) -> Result<DbValue, MaterializationError>;
}

impl<C: RowCursor + ?Sized> RowCursor for &mut C {
    fn move_next(&mut self) -> Result<bool, MaterializationError> {
        (**self).move_next()
    }

    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn name_at(&self, index: usize) -> Option<&str> {
        (**self).name_at(index)
    }

    fn is_null(&self, index: usize) -> bool {
        (**self).is_null(index)
    }

    fn get_value(&self, index: usize) -> Result<DbValue, MaterializationError> {
        (**self).get_value(index)
    }
}

/// Cursor over rows held in memory, for tests and for callers that already buffered a result.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    names: Vec<String>,
    rows: std::vec::IntoIter<Vec<DbValue>>,
    current: Option<Vec<DbValue>>,
}

impl MemoryCursor {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, rows: Vec<Vec<DbValue>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            rows: rows.into_iter(),
            current: None,
        }
    }

    /// Rows given as JSON arrays; cell types are inferred.
    pub fn from_json<S: Into<String>>(names: impl IntoIterator<Item = S>, rows: &[Value]) -> Result<Self, MaterializationError> {
        let mut converted = Vec::with_capacity(rows.len());
        for (n, row) in rows.iter().enumerate() {
            let cells = row.as_array()
                .ok_or_else(|| MaterializationError::Cursor(format!("row {} is not an array", n)))?;
            let values = cells.iter()
                .map(|cell| DbValue::from_json(cell, None).map_err(MaterializationError::Cursor))
                .collect::<Result<Vec<_>, _>>()?;
            converted.push(values);
        }
        Ok(Self::new(names, converted))
    }

    fn cell(&self, index: usize) -> Result<&DbValue, MaterializationError> {
        let row = self.current.as_ref().ok_or_else(|| MaterializationError::Cursor("no current row".into()))?;
        row.get(index).ok_or(MaterializationError::ColumnOutOfRange { index, field_count: row.len() })
    }
}

impl RowCursor for MemoryCursor {
    fn move_next(&mut self) -> Result<bool, MaterializationError> {
        self.current = self.rows.next();
        match &self.current {
            Some(row) if row.len() != self.names.len() => Err(MaterializationError::Cursor(format!(
                "row has {} value(s) for {} column(s)", row.len(), self.names.len()
            ))),
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    fn field_count(&self) -> usize {
        self.names.len()
    }

    fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    fn is_null(&self, index: usize) -> bool {
        self.cell(index).map(DbValue::is_null).unwrap_or(true)
    }

    fn get_value(&self, index: usize) -> Result<DbValue, MaterializationError> {
        self.cell(index).cloned()
    }
}
