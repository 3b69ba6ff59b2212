//! Unsigned LEB128 length prefixes.
//!
//! Record lengths are 32-bit, so a prefix is at most five bytes long. The
//! reader distinguishes a stream that ends cleanly before a prefix from one
//! that ends inside it.

use std::io::{self, Read};

use thiserror::Error;

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_BITS: u8 = 0x7F;

#[derive(Debug, Error)]
pub enum VarintError {
    #[error("stream ended after {bytes_read} byte(s) of a varint")]
    Truncated { bytes_read: usize },

    #[error("varint does not fit in 32 bits")]
    Overflow,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Read one varint.
///
/// Returns `Ok(None)` when the stream is already exhausted, which is how a log
/// ends after its final record.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<Option<u32>, VarintError> {
    let mut value: u64 = 0;

    for index in 0..MAX_VARINT_LEN {
        let byte = match read_byte(reader)? {
            Some(byte) => byte,
            None if index == 0 => return Ok(None),
            None => return Err(VarintError::Truncated { bytes_read: index }),
        };

        value |= u64::from(byte & PAYLOAD_BITS) << (7 * index);

        if byte & CONTINUATION == 0 {
            return u32::try_from(value)
                .map(Some)
                .map_err(|_| VarintError::Overflow);
        }
    }

    Err(VarintError::Overflow)
}

/// Append the minimal encoding of `value` to `buf`.
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    while value >= u32::from(CONTINUATION) {
        buf.push((value as u8 & PAYLOAD_BITS) | CONTINUATION);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Length in bytes of the minimal encoding of `value`.
pub fn encoded_len(value: u32) -> usize {
    let significant_bits = 32 - (value | 1).leading_zeros() as usize;
    significant_bits.div_ceil(7)
}

fn read_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
