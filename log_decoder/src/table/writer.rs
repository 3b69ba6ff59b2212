//! Delimited-text serialization of a [`FrameTable`].

use std::{
    fmt::Write as _,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::log::Cell;

use super::error::{TableError, TableResult};
use super::frame_table::FrameTable;

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_FLOAT_PRECISION: usize = 6;
/// Largest accepted number of digits after the decimal point.
pub const MAX_FLOAT_PRECISION: usize = 17;

/// Writes a header row of column names, then one line per table row.
///
/// Floats use a fixed number of decimal digits; integers are written exactly.
/// No value can contain the delimiter, so nothing is quoted or escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableWriter {
    delimiter: char,
    precision: usize,
}

impl Default for TableWriter {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            precision: DEFAULT_FLOAT_PRECISION,
        }
    }
}

impl TableWriter {
    pub fn new(delimiter: char, precision: usize) -> TableResult<Self> {
        if !is_valid_delimiter(delimiter) {
            return Err(TableError::InvalidDelimiter(delimiter));
        }
        if precision > MAX_FLOAT_PRECISION {
            return Err(TableError::InvalidPrecision(precision));
        }
        Ok(Self {
            delimiter,
            precision,
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Render the whole table as text.
    pub fn render(&self, table: &FrameTable) -> String {
        let mut out = String::new();

        for (index, name) in table.column_names().enumerate() {
            if index > 0 {
                out.push(self.delimiter);
            }
            out.push_str(name);
        }
        out.push('\n');

        for row in table.rows() {
            for (index, cell) in row.iter().enumerate() {
                if index > 0 {
                    out.push(self.delimiter);
                }
                self.push_cell(&mut out, *cell);
            }
            out.push('\n');
        }

        out
    }

    /// Render `table` and write it to `writer` in one call. Returns the byte count.
    pub fn write<W: Write>(&self, table: &FrameTable, mut writer: W) -> io::Result<usize> {
        let rendered = self.render(table);
        writer.write_all(rendered.as_bytes())?;
        writer.flush()?;
        Ok(rendered.len())
    }

    /// Write the table to `path`, replacing any existing file.
    ///
    /// The text goes to a temporary file in the same directory which is then
    /// renamed over `path`, so a failed write leaves no partial table behind.
    pub fn write_to_path(&self, table: &FrameTable, path: &Path) -> TableResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(dir).map_err(|err| TableError::io(dir, err))?;
        let bytes = self
            .write(table, &mut staged)
            .and_then(|bytes| staged.as_file().sync_all().map(|()| bytes))
            .map_err(|err| TableError::io(staged.path(), err))?;
        staged
            .persist(path)
            .map_err(|err| TableError::io(path, err.error))?;

        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.width(),
            bytes,
            "wrote table"
        );
        Ok(())
    }

    fn push_cell(&self, out: &mut String, cell: Cell) {
        // Writing into a String cannot fail.
        let _ = match cell {
            Cell::Unsigned(value) => write!(out, "{value}"),
            Cell::Float(value) => write!(out, "{value:.prec$}", prec = self.precision),
        };
    }
}

/// Characters that can never occur in a formatted integer, float, NaN, or
/// infinity, and are not line breaks.
fn is_valid_delimiter(delimiter: char) -> bool {
    match delimiter {
        '\t' | ' ' => true,
        '.' | '-' | '+' => false,
        c => c.is_ascii_punctuation(),
    }
}
