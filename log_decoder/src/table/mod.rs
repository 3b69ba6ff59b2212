pub mod bitfield;
pub mod error;
pub mod frame_table;
pub mod writer;

pub use bitfield::{expand_validity_flags, FlagField, ValidityFlags, GPS_VALIDITY_FIELDS};
pub use error::{TableError, TableResult};
pub use frame_table::FrameTable;
pub use writer::{TableWriter, DEFAULT_DELIMITER, DEFAULT_FLOAT_PRECISION, MAX_FLOAT_PRECISION};
