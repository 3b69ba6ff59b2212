//! In-memory table built from a complete frame sequence.

use crate::log::{Cell, Field, Frame, FrameKind, LogFile};

use super::error::{TableError, TableResult};

/// Fixed-width table of decoded frames.
///
/// Columns start as the frame kind's schema and may only be appended to; rows
/// keep decode order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    kind: FrameKind,
    columns: Vec<Field>,
    rows: Vec<Vec<Cell>>,
}

impl FrameTable {
    /// Empty table carrying the schema columns of `kind`.
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            columns: kind.schema().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn from_frames(kind: FrameKind, frames: &[Frame]) -> TableResult<Self> {
        let mut table = Self::new(kind);
        table.rows.reserve_exact(frames.len());

        for (row, frame) in frames.iter().enumerate() {
            if frame.kind() != kind {
                return Err(TableError::KindMismatch {
                    expected: kind,
                    found: frame.kind(),
                    row,
                });
            }
            table.rows.push(frame.cells());
        }

        Ok(table)
    }

    pub fn from_log(log: &LogFile) -> TableResult<Self> {
        Self::from_frames(log.kind, &log.frames)
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|field| field.name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|field| field.name == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Cell> + '_> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index]))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a column after all existing ones. `values` must hold one cell per row.
    pub fn push_column(&mut self, field: Field, values: Vec<Cell>) -> TableResult<()> {
        if self.column_index(field.name).is_some() {
            return Err(TableError::DuplicateColumn(field.name));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::RowCount {
                name: field.name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.columns.push(field);
        Ok(())
    }
}
