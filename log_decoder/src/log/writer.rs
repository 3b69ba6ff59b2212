//! Log encoding, the inverse of [`crate::log::decoder`].
//!
//! Produces the same byte layout the flight computer's storage task writes:
//! the header line followed by length-delimited frame payloads.

use std::io::Write;

use super::error::{LogError, LogResult};
use super::frames::{Frame, FrameKind};
use super::header::LogHeader;
use super::varint::{encode_varint, MAX_VARINT_LEN};

pub struct LogWriter<W: Write> {
    writer: W,
    kind: Option<FrameKind>,
    frames_written: usize,
}

impl<W: Write> LogWriter<W> {
    /// Write `header` and return a writer positioned for the first record.
    pub fn new(mut writer: W, header: &LogHeader) -> LogResult<Self> {
        writer
            .write_all(&header.to_line())
            .map_err(|source| LogError::Write { frames: 0, source })?;
        Ok(Self {
            writer,
            kind: None,
            frames_written: 0,
        })
    }

    /// Append one record. All records of a log share the first frame's kind.
    pub fn write_frame(&mut self, frame: &Frame) -> LogResult<()> {
        let expected = *self.kind.get_or_insert(frame.kind());
        if frame.kind() != expected {
            return Err(LogError::MixedKinds {
                expected,
                found: frame.kind(),
            });
        }

        let payload = frame.encode_payload();
        let mut record = Vec::with_capacity(MAX_VARINT_LEN + payload.len());
        encode_varint(payload.len() as u32, &mut record);
        record.extend_from_slice(&payload);

        self.writer
            .write_all(&record)
            .map_err(|source| LogError::Write {
                frames: self.frames_written,
                source,
            })?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> LogResult<W> {
        let frames = self.frames_written;
        self.writer
            .flush()
            .map_err(|source| LogError::Write { frames, source })?;
        Ok(self.writer)
    }
}
