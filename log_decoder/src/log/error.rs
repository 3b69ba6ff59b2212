use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use super::frames::{FrameKind, PayloadError};

/// Where in the stream the input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPoint {
    /// Before the header's line feed.
    Header,
    /// Inside the varint length prefix of a record.
    LengthPrefix { record: usize },
    /// Inside a record payload.
    Payload {
        record: usize,
        declared: u32,
        available: usize,
    },
}

impl fmt::Display for TruncationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TruncationPoint::Header => f.write_str("header line"),
            TruncationPoint::LengthPrefix { record } => {
                write!(f, "length prefix of record {record}")
            }
            TruncationPoint::Payload {
                record,
                declared,
                available,
            } => write!(
                f,
                "payload of record {record} (declared {declared} bytes, {available} available)"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown frame kind '{0}': expected one of sensor, gps, state")]
    UnknownFrameKind(String),

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed at byte {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("write failed after {frames} frame(s): {source}")]
    Write {
        frames: usize,
        #[source]
        source: io::Error,
    },

    #[error("cannot append a {found} frame to a {expected} log")]
    MixedKinds { expected: FrameKind, found: FrameKind },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("truncated stream in {location} at byte {offset}")]
    TruncatedStream {
        offset: u64,
        location: TruncationPoint,
    },

    #[error("length prefix of record {record} at byte {offset} does not fit in 32 bits")]
    LengthOverflow { record: usize, offset: u64 },

    #[error("record {record} at byte {offset} does not match the {kind} schema: {source}")]
    SchemaMismatch {
        record: usize,
        offset: u64,
        kind: FrameKind,
        #[source]
        source: PayloadError,
    },
}

pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_header(details: impl fmt::Display) -> Self {
        Self::InvalidHeader(details.to_string())
    }

    pub fn is_truncation(&self) -> bool {
        matches!(self, LogError::TruncatedStream { .. })
    }

    /// Index of the record the error refers to, if any.
    pub fn record(&self) -> Option<usize> {
        match self {
            LogError::TruncatedStream {
                location: TruncationPoint::LengthPrefix { record },
                ..
            }
            | LogError::TruncatedStream {
                location: TruncationPoint::Payload { record, .. },
                ..
            }
            | LogError::LengthOverflow { record, .. }
            | LogError::SchemaMismatch { record, .. } => Some(*record),
            _ => None,
        }
    }
}
