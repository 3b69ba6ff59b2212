//! Decoder for the binary telemetry logs written by the flight computer.
//!
//! A log is a one-line firmware header followed by length-delimited protobuf
//! frames of a single kind. [`log`] turns the bytes into typed frames,
//! [`table`] lays them out as rows and writes delimited text, and [`app`]
//! wires both together behind the `decode_log` binary.

pub mod app;
pub mod log;
pub mod report;
pub mod table;

pub use log::{decode_log, Frame, FrameKind, LogError, LogFile, LogHeader};
pub use table::{expand_validity_flags, FrameTable, TableError, TableWriter};
