//! Log header line.
//!
//! A log starts with the firmware build specifier as one line of UTF-8 text
//! terminated by `\n`. The header is metadata only and never becomes a column.

use std::{fmt, io::BufRead};

use super::error::{LogError, LogResult, TruncationPoint};

const LINE_FEED: u8 = b'\n';

/// Firmware build specifier read from the first line of a log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogHeader {
    text: String,
}

impl LogHeader {
    /// Build a header for writing. The text must not contain a line feed.
    pub fn new(text: impl Into<String>) -> LogResult<Self> {
        let text = text.into();
        if text.contains(char::from(LINE_FEED)) {
            return Err(LogError::invalid_header("header text contains a line feed"));
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Bytes occupied in the file, including the line feed.
    pub fn encoded_len(&self) -> usize {
        self.text.len() + 1
    }

    pub(crate) fn to_line(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.encoded_len());
        line.extend_from_slice(self.text.as_bytes());
        line.push(LINE_FEED);
        line
    }
}

impl fmt::Display for LogHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Consume the header line, leaving `reader` at the first record.
pub fn read_header<R: BufRead>(reader: &mut R) -> LogResult<LogHeader> {
    let mut line = Vec::new();
    let read = reader
        .read_until(LINE_FEED, &mut line)
        .map_err(|source| LogError::Read { offset: 0, source })?;

    if read == 0 || line.last() != Some(&LINE_FEED) {
        return Err(LogError::TruncatedStream {
            offset: read as u64,
            location: TruncationPoint::Header,
        });
    }
    line.pop();

    let text = String::from_utf8(line).map_err(|err| {
        LogError::invalid_header(format!(
            "not valid UTF-8 at byte {}",
            err.utf8_error().valid_up_to()
        ))
    })?;

    Ok(LogHeader { text })
}
