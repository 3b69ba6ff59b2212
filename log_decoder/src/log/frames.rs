//! Telemetry frame declarations.
//!
//! Every frame kind is declared once through `telemetry_frame!`, which emits the
//! prost wire message, the strongly-typed frame struct, and the ordered column
//! schema from the same field list. Column order therefore always equals wire
//! declaration order.
//!
//! The log format requires every schema field to be present in every payload.
//! The wire messages therefore use proto2-style optional fields, and a missing
//! field is reported instead of being defaulted to zero.

use std::{fmt, str::FromStr};

use prost::Message;
use thiserror::Error;

use super::error::LogError;
use super::schema::{Cell, Field, Scalar};

/// Why a single payload could not be turned into a frame.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
}

macro_rules! telemetry_frame {
    (
        $(#[$meta:meta])*
        pub struct $frame:ident => $wire:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty = $pb:ident($tag:tt),
            )+
        }
    ) => {
        #[doc = concat!("Protobuf wire message backing [`", stringify!($frame), "`].")]
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct $wire {
            $(
                #[prost($pb, optional, tag = $tag)]
                pub $field: ::core::option::Option<$ty>,
            )+
        }

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $frame {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )+
        }

        impl $frame {
            /// Output columns, in wire declaration order.
            pub const SCHEMA: &'static [Field] = &[
                $( Field::new(stringify!($field), <$ty as Scalar>::TYPE), )+
            ];

            /// Row values in [`Self::SCHEMA`] order.
            pub fn cells(&self) -> Vec<Cell> {
                vec![ $( Scalar::into_cell(self.$field), )+ ]
            }

            /// Decode one record payload, requiring every schema field.
            pub fn decode_payload(payload: &[u8]) -> Result<Self, PayloadError> {
                let wire = $wire::decode(payload)?;
                Ok(Self {
                    $(
                        $field: wire
                            .$field
                            .ok_or(PayloadError::MissingField(stringify!($field)))?,
                    )+
                })
            }

            pub fn to_wire(&self) -> $wire {
                $wire {
                    $( $field: Some(self.$field), )+
                }
            }
        }
    };
}

telemetry_frame! {
    /// Raw IMU, barometer, and magnetometer sample.
    pub struct SensorFrame => SensorFrameMessage {
        /// Microseconds since boot.
        timestamp: u64 = uint64("1"),
        temperature: f32 = float("2"),
        pressure: f32 = float("3"),
        /// High-g accelerometer.
        acc_h_x: f32 = float("4"),
        acc_h_y: f32 = float("5"),
        acc_h_z: f32 = float("6"),
        /// IMU accelerometer.
        acc_i_x: f32 = float("7"),
        acc_i_y: f32 = float("8"),
        acc_i_z: f32 = float("9"),
        /// IMU gyroscope.
        rot_i_x: f32 = float("10"),
        rot_i_y: f32 = float("11"),
        rot_i_z: f32 = float("12"),
        mag_i_x: f32 = float("13"),
        mag_i_y: f32 = float("14"),
        mag_i_z: f32 = float("15"),
    }
}

telemetry_frame! {
    /// GNSS navigation solution.
    pub struct GpsFrame => GpsFrameMessage {
        /// Microseconds since boot.
        timestamp: u64 = uint64("1"),
        year: u32 = uint32("2"),
        month: u32 = uint32("3"),
        day: u32 = uint32("4"),
        hour: u32 = uint32("5"),
        min: u32 = uint32("6"),
        sec: u32 = uint32("7"),
        /// Packed fix-quality bitfield, see [`crate::table::bitfield`].
        valid_flags: u32 = uint32("8"),
        num_sats: u32 = uint32("9"),
        lon: f64 = double("10"),
        lat: f64 = double("11"),
        height: f32 = float("12"),
        height_msl: f32 = float("13"),
        accuracy_horiz: f32 = float("14"),
        accuracy_vertical: f32 = float("15"),
        vel_north: f32 = float("16"),
        vel_east: f32 = float("17"),
        vel_down: f32 = float("18"),
        ground_speed: f32 = float("19"),
        hdg: f32 = float("20"),
        accuracy_speed: f32 = float("21"),
        accuracy_hdg: f32 = float("22"),
    }
}

telemetry_frame! {
    /// State estimator output.
    pub struct StateFrame => StateFrameMessage {
        /// Microseconds since boot.
        timestamp: u64 = uint64("1"),
        /// Flight-logic phase index (init, ready, boost, coast, descent, final, landed).
        flight_phase: u32 = uint32("2"),
        pos_vert: f32 = float("3"),
        vel_vert: f32 = float("4"),
        acc_vert: f32 = float("5"),
        pos_geo_x: f32 = float("6"),
        pos_geo_y: f32 = float("7"),
        pos_geo_z: f32 = float("8"),
        vel_geo_x: f32 = float("9"),
        vel_geo_y: f32 = float("10"),
        vel_geo_z: f32 = float("11"),
        acc_geo_x: f32 = float("12"),
        acc_geo_y: f32 = float("13"),
        acc_geo_z: f32 = float("14"),
        angvel_body_x: f32 = float("15"),
        angvel_body_y: f32 = float("16"),
        angvel_body_z: f32 = float("17"),
        orientation_w: f32 = float("18"),
        orientation_x: f32 = float("19"),
        orientation_y: f32 = float("20"),
        orientation_z: f32 = float("21"),
    }
}

/// The schema applied to every record of a log. Logs carry no type tag, so
/// the kind is chosen by the caller for the whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FrameKind {
    Sensor,
    Gps,
    State,
}

impl FrameKind {
    pub const ALL: [FrameKind; 3] = [FrameKind::Sensor, FrameKind::Gps, FrameKind::State];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::Sensor => "sensor",
            FrameKind::Gps => "gps",
            FrameKind::State => "state",
        }
    }

    pub fn schema(self) -> &'static [Field] {
        match self {
            FrameKind::Sensor => SensorFrame::SCHEMA,
            FrameKind::Gps => GpsFrame::SCHEMA,
            FrameKind::State => StateFrame::SCHEMA,
        }
    }

    pub fn decode_payload(self, payload: &[u8]) -> Result<Frame, PayloadError> {
        Ok(match self {
            FrameKind::Sensor => Frame::Sensor(SensorFrame::decode_payload(payload)?),
            FrameKind::Gps => Frame::Gps(GpsFrame::decode_payload(payload)?),
            FrameKind::State => Frame::State(StateFrame::decode_payload(payload)?),
        })
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FrameKind {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sensor" => Ok(FrameKind::Sensor),
            "gps" => Ok(FrameKind::Gps),
            "state" => Ok(FrameKind::State),
            _ => Err(LogError::UnknownFrameKind(s.to_string())),
        }
    }
}

/// One decoded telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Sensor(SensorFrame),
    Gps(GpsFrame),
    State(StateFrame),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Sensor(_) => FrameKind::Sensor,
            Frame::Gps(_) => FrameKind::Gps,
            Frame::State(_) => FrameKind::State,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Frame::Sensor(frame) => frame.timestamp,
            Frame::Gps(frame) => frame.timestamp,
            Frame::State(frame) => frame.timestamp,
        }
    }

    /// Row values in `self.kind().schema()` order.
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            Frame::Sensor(frame) => frame.cells(),
            Frame::Gps(frame) => frame.cells(),
            Frame::State(frame) => frame.cells(),
        }
    }

    /// Protobuf payload bytes, without the length prefix.
    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            Frame::Sensor(frame) => frame.to_wire().encode_to_vec(),
            Frame::Gps(frame) => frame.to_wire().encode_to_vec(),
            Frame::State(frame) => frame.to_wire().encode_to_vec(),
        }
    }
}

impl From<SensorFrame> for Frame {
    fn from(frame: SensorFrame) -> Self {
        Frame::Sensor(frame)
    }
}

impl From<GpsFrame> for Frame {
    fn from(frame: GpsFrame) -> Self {
        Frame::Gps(frame)
    }
}

impl From<StateFrame> for Frame {
    fn from(frame: StateFrame) -> Self {
        Frame::State(frame)
    }
}
