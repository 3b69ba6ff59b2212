pub mod decoder;
pub mod error;
pub mod frames;
pub mod header;
pub mod schema;
pub mod varint;
pub mod writer;

pub use decoder::{decode_log, decode_reader, FrameDecoder, LogFile};
pub use error::{LogError, LogResult, TruncationPoint};
pub use frames::{Frame, FrameKind, GpsFrame, PayloadError, SensorFrame, StateFrame};
pub use header::{read_header, LogHeader};
pub use schema::{Cell, Field, FieldType};
pub use varint::{encode_varint, read_varint, VarintError};
pub use writer::LogWriter;
