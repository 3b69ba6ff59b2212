//! Column schema primitives shared by the frame declarations and the table.

use std::fmt;

/// Semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    U32,
    U64,
    F32,
    F64,
}

impl FieldType {
    pub fn is_float(self) -> bool {
        matches!(self, FieldType::F32 | FieldType::F64)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::U32 => "u32",
            FieldType::U64 => "u64",
            FieldType::F32 => "f32",
            FieldType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// One named, typed column of a frame schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// A single table value.
///
/// Integers are widened to `u64` and floats to `f64`; widening is lossless for
/// every schema type, so the writer can format exactly what was decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Unsigned(u64),
    Float(f64),
}

impl Cell {
    pub fn as_unsigned(self) -> Option<u64> {
        match self {
            Cell::Unsigned(value) => Some(value),
            Cell::Float(_) => None,
        }
    }

    pub fn as_float(self) -> Option<f64> {
        match self {
            Cell::Float(value) => Some(value),
            Cell::Unsigned(_) => None,
        }
    }
}

/// Rust scalar types that can appear in a frame schema.
pub trait Scalar: Copy {
    const TYPE: FieldType;

    fn into_cell(self) -> Cell;
}

impl Scalar for u32 {
    const TYPE: FieldType = FieldType::U32;

    fn into_cell(self) -> Cell {
        Cell::Unsigned(u64::from(self))
    }
}

impl Scalar for u64 {
    const TYPE: FieldType = FieldType::U64;

    fn into_cell(self) -> Cell {
        Cell::Unsigned(self)
    }
}

impl Scalar for f32 {
    const TYPE: FieldType = FieldType::F32;

    fn into_cell(self) -> Cell {
        Cell::Float(f64::from(self))
    }
}

impl Scalar for f64 {
    const TYPE: FieldType = FieldType::F64;

    fn into_cell(self) -> Cell {
        Cell::Float(self)
    }
}
