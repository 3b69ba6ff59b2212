use std::{io, path::PathBuf};

use thiserror::Error;

use crate::log::FrameKind;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table holds {expected} frames but row {row} is a {found} frame")]
    KindMismatch {
        expected: FrameKind,
        found: FrameKind,
        row: usize,
    },

    #[error("column '{0}' already exists")]
    DuplicateColumn(&'static str),

    #[error("column '{name}' has {actual} values but the table has {expected} rows")]
    RowCount {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' does not hold unsigned 32-bit values")]
    ColumnType(&'static str),

    #[error("invalid delimiter {0:?}: it could appear inside a formatted value")]
    InvalidDelimiter(char),

    #[error("invalid float precision {0}: at most {max} decimal digits", max = super::writer::MAX_FLOAT_PRECISION)]
    InvalidPrecision(usize),

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type TableResult<T> = Result<T, TableError>;

impl TableError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
