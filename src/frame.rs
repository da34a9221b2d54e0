//! The in-memory tabular structure shared by every pipeline stage.
//!
//! A [`Frame`] is an ordered header plus ordered rows of nullable text
//! cells. Columns are schemaless on purpose: the source file decides the
//! header and every cell is carried as `Option<String>`, with `None`
//! standing for an empty source field. Sinks persist all columns as text.

use serde::{Deserialize, Serialize};

/// Header plus rows; the unit of data handed between pipeline stages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Frame {
    /// Create an empty frame with the given header.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Column names in source order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in source order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows (the header does not count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row. The row's arity must match the header.
    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row arity mismatch");
        self.rows.push(row);
    }

    /// Copy of this frame with every present value of one column passed
    /// through `f`. Null cells stay null; other columns are untouched.
    #[must_use]
    pub fn map_column<F>(&self, index: usize, mut f: F) -> Frame
    where
        F: FnMut(&str) -> String,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if let Some(cell) = row.get_mut(index) {
                    *cell = cell.as_deref().map(&mut f);
                }
                row
            })
            .collect();
        Frame {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        let mut f = Frame::new(vec!["id".into(), "name".into()]);
        f.push_row(vec![Some("1".into()), Some("a".into())]);
        f.push_row(vec![None, Some("b".into())]);
        f
    }

    #[test]
    fn column_lookup() {
        let f = sample();
        assert_eq!(f.column_index("name"), Some(1));
        assert_eq!(f.column_index("missing"), None);
    }

    #[test]
    fn map_column_skips_nulls() {
        let f = sample().map_column(0, |v| format!("<{v}>"));
        assert_eq!(f.rows()[0][0].as_deref(), Some("<1>"));
        assert_eq!(f.rows()[1][0], None);
        // untouched column
        assert_eq!(f.rows()[1][1].as_deref(), Some("b"));
    }
}
