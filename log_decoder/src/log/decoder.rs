//! Record decoding.
//!
//! After the header a log is a flat sequence of `varint(len) || payload[len]`
//! records with no trailing marker. [`FrameDecoder`] walks them in one forward
//! pass and stops at the first malformed record.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    iter::FusedIterator,
    path::Path,
};

use tracing::{debug, trace};

use super::error::{LogError, LogResult, TruncationPoint};
use super::frames::{Frame, FrameKind};
use super::header::{read_header, LogHeader};
use super::varint::{read_varint, VarintError};

/// Upper bound on payload buffer preallocation; a corrupt length prefix must
/// not trigger a multi-gigabyte allocation before the short read is noticed.
const MAX_PREALLOC: usize = 64 * 1024;

/// A fully decoded log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFile {
    pub header: LogHeader,
    pub kind: FrameKind,
    pub frames: Vec<Frame>,
    /// Total bytes consumed, header included.
    pub bytes_read: u64,
}

impl LogFile {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Reader wrapper tracking the absolute stream position.
struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }
}

/// Iterator over the records of one log, all decoded as the same kind.
///
/// Yields frames in file order. The first error is yielded once, after which
/// the iterator is exhausted.
pub struct FrameDecoder<R> {
    reader: CountingReader<R>,
    kind: FrameKind,
    record: usize,
    done: bool,
}

impl<R: Read> FrameDecoder<R> {
    /// Decode records from `reader`, which must be positioned at the first record.
    pub fn new(reader: R, kind: FrameKind) -> Self {
        Self::with_offset(reader, kind, 0)
    }

    /// Like [`FrameDecoder::new`], reporting offsets relative to `offset`
    /// (normally the header length).
    pub fn with_offset(reader: R, kind: FrameKind, offset: u64) -> Self {
        Self {
            reader: CountingReader {
                inner: reader,
                position: offset,
            },
            kind,
            record: 0,
            done: false,
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Number of frames decoded so far.
    pub fn records_decoded(&self) -> usize {
        self.record
    }

    /// Current byte offset in the stream.
    pub fn offset(&self) -> u64 {
        self.reader.position
    }

    fn next_frame(&mut self) -> LogResult<Option<Frame>> {
        let record = self.record;
        let record_offset = self.reader.position;

        let declared = match read_varint(&mut self.reader) {
            Ok(Some(len)) => len,
            Ok(None) => return Ok(None),
            Err(VarintError::Truncated { .. }) => {
                return Err(LogError::TruncatedStream {
                    offset: record_offset,
                    location: TruncationPoint::LengthPrefix { record },
                })
            }
            Err(VarintError::Overflow) => {
                return Err(LogError::LengthOverflow {
                    record,
                    offset: record_offset,
                })
            }
            Err(VarintError::Io(source)) => {
                return Err(LogError::Read {
                    offset: self.reader.position,
                    source,
                })
            }
        };

        let expected = declared as usize;
        let mut payload = Vec::with_capacity(expected.min(MAX_PREALLOC));
        let read = Read::take(&mut self.reader, u64::from(declared)).read_to_end(&mut payload);
        if let Err(source) = read {
            return Err(LogError::Read {
                offset: self.reader.position,
                source,
            });
        }

        if payload.len() < expected {
            return Err(LogError::TruncatedStream {
                offset: record_offset,
                location: TruncationPoint::Payload {
                    record,
                    declared,
                    available: payload.len(),
                },
            });
        }

        let frame = self
            .kind
            .decode_payload(&payload)
            .map_err(|source| LogError::SchemaMismatch {
                record,
                offset: record_offset,
                kind: self.kind,
                source,
            })?;

        trace!(
            record,
            offset = record_offset,
            len = declared,
            timestamp = frame.timestamp(),
            "decoded frame"
        );
        self.record += 1;
        Ok(Some(frame))
    }
}

impl<R: Read> Iterator for FrameDecoder<R> {
    type Item = LogResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read> FusedIterator for FrameDecoder<R> {}

/// Decode a complete log from `reader`. Any error discards every frame read so far.
pub fn decode_reader<R: BufRead>(mut reader: R, kind: FrameKind) -> LogResult<LogFile> {
    let header = read_header(&mut reader)?;
    debug!(header = %header, kind = %kind, "read log header");

    let mut decoder = FrameDecoder::with_offset(reader, kind, header.encoded_len() as u64);
    let frames = decoder.by_ref().collect::<LogResult<Vec<_>>>()?;

    debug!(frames = frames.len(), bytes = decoder.offset(), "reached end of log");
    Ok(LogFile {
        header,
        kind,
        frames,
        bytes_read: decoder.offset(),
    })
}

/// Open and decode the log at `path`.
pub fn decode_log(path: &Path, kind: FrameKind) -> LogResult<LogFile> {
    let file = File::open(path).map_err(|source| LogError::io(path, source))?;
    decode_reader(BufReader::new(file), kind)
}
