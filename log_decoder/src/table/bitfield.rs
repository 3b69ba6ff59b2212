//! GPS validity-flag decomposition.
//!
//! The GPS task packs the receiver's fix-quality indicators into the
//! `valid_flags` field of every GPS frame:
//!
//! | bits  | field         |
//! |-------|---------------|
//! | 0     | date_valid    |
//! | 1     | time_valid    |
//! | 2     | time_resolved |
//! | 3-5   | fix_type      |
//! | 8     | fix_valid     |
//! | 9     | diff_used     |
//! | 10-12 | psm_state     |
//! | 14    | hdg_veh_valid |
//! | 15-16 | carrier_phase |
//! | 19    | invalid_llh   |
//!
//! Expansion appends one column per field in the table's bit order above.

use crate::log::{Cell, Field, FieldType, FrameKind};

use super::error::{TableError, TableResult};
use super::frame_table::FrameTable;

/// Source column holding the packed flags.
pub const VALID_FLAGS_COLUMN: &str = "valid_flags";

/// One named sub-field of the validity bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagField {
    pub name: &'static str,
    pub mask: u32,
}

impl FlagField {
    pub const fn new(name: &'static str, mask: u32) -> Self {
        Self { name, mask }
    }

    pub fn shift(&self) -> u32 {
        self.mask.trailing_zeros()
    }

    pub fn extract(&self, flags: u32) -> u32 {
        (flags & self.mask) >> self.shift()
    }
}

pub const VALIDITY_FIELD_COUNT: usize = 10;

/// Derived fields in output column order.
pub const GPS_VALIDITY_FIELDS: [FlagField; VALIDITY_FIELD_COUNT] = [
    FlagField::new("date_valid", 0b1),
    FlagField::new("time_valid", 0b1 << 1),
    FlagField::new("time_resolved", 0b1 << 2),
    FlagField::new("fix_type", 0b111 << 3),
    FlagField::new("fix_valid", 0b1 << 8),
    FlagField::new("diff_used", 0b1 << 9),
    FlagField::new("psm_state", 0b111 << 10),
    FlagField::new("hdg_veh_valid", 0b1 << 14),
    FlagField::new("carrier_phase", 0b11 << 15),
    FlagField::new("invalid_llh", 0b1 << 19),
];

/// Packed GPS validity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityFlags(pub u32);

impl ValidityFlags {
    /// Every derived field with its value, in [`GPS_VALIDITY_FIELDS`] order.
    pub fn decompose(self) -> [(&'static str, u32); VALIDITY_FIELD_COUNT] {
        GPS_VALIDITY_FIELDS.map(|field| (field.name, field.extract(self.0)))
    }

    /// Value of the derived field called `name`.
    pub fn get(self, name: &str) -> Option<u32> {
        GPS_VALIDITY_FIELDS
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.extract(self.0))
    }
}

/// Append the derived validity columns to a GPS table.
///
/// Tables of other kinds, or without a `valid_flags` column, are left alone.
/// Returns the number of columns added.
pub fn expand_validity_flags(table: &mut FrameTable) -> TableResult<usize> {
    if table.kind() != FrameKind::Gps {
        return Ok(0);
    }
    let Some(source) = table.column_index(VALID_FLAGS_COLUMN) else {
        return Ok(0);
    };

    if let Some(existing) = GPS_VALIDITY_FIELDS
        .iter()
        .find(|field| table.column_index(field.name).is_some())
    {
        return Err(TableError::DuplicateColumn(existing.name));
    }

    let flags = table
        .rows()
        .iter()
        .map(|row| {
            row[source]
                .as_unsigned()
                .and_then(|value| u32::try_from(value).ok())
                .ok_or(TableError::ColumnType(VALID_FLAGS_COLUMN))
        })
        .collect::<TableResult<Vec<u32>>>()?;

    for field in GPS_VALIDITY_FIELDS {
        let values = flags
            .iter()
            .map(|&packed| Cell::Unsigned(u64::from(field.extract(packed))))
            .collect();
        table.push_column(Field::new(field.name, FieldType::U32), values)?;
    }

    Ok(VALIDITY_FIELD_COUNT)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::log::{Frame, GpsFrame, SensorFrame};
    use proptest::prelude::*;

    fn gps_table(flags: &[u32]) -> FrameTable {
        let frames: Vec<Frame> = flags
            .iter()
            .enumerate()
            .map(|(i, &valid_flags)| {
                Frame::from(GpsFrame {
                    timestamp: i as u64,
                    valid_flags,
                    ..GpsFrame::default()
                })
            })
            .collect();
        FrameTable::from_frames(FrameKind::Gps, &frames).unwrap()
    }

    fn derived(flags: u32) -> Vec<(&'static str, u32)> {
        ValidityFlags(flags).decompose().to_vec()
    }

    #[test]
    fn masks__disjoint_and_contiguous() {
        let mut seen = 0u32;
        for field in GPS_VALIDITY_FIELDS {
            assert_eq!(seen & field.mask, 0, "{} overlaps", field.name);
            let width = field.mask.count_ones();
            assert_eq!(field.mask >> field.shift(), (1 << width) - 1, "{}", field.name);
            seen |= field.mask;
        }
    }

    #[test]
    fn decompose__bits_0_and_8__then_date_and_fix_valid_only() {
        for (name, value) in derived(0b1_0000_0001) {
            let expected = u32::from(matches!(name, "date_valid" | "fix_valid"));
            assert_eq!(value, expected, "{name}");
        }
    }

    #[test]
    fn decompose__0x109__then_date_valid_fix_type_one_fix_valid() {
        let flags = ValidityFlags(0x109);
        for (name, value) in flags.decompose() {
            let expected = u32::from(matches!(name, "date_valid" | "fix_type" | "fix_valid"));
            assert_eq!(value, expected, "{name}");
        }
        assert_eq!(flags.get("fix_type"), Some(1));
        assert_eq!(flags.get("fix_valid"), Some(1));
    }

    #[test]
    fn decompose__multi_bit_fields__then_shifted_down() {
        // fix_type = 3 (3D), psm_state = 5, carrier_phase = 2
        let flags = ValidityFlags((3 << 3) | (5 << 10) | (2 << 15));
        assert_eq!(flags.get("fix_type"), Some(3));
        assert_eq!(flags.get("psm_state"), Some(5));
        assert_eq!(flags.get("carrier_phase"), Some(2));
        assert_eq!(flags.get("invalid_llh"), Some(0));
        assert_eq!(flags.get("unknown"), None);
    }

    #[test]
    fn expand__gps_table__then_appends_columns_in_bit_order() {
        let mut table = gps_table(&[0x109, 0x0008_0000]);
        let original: Vec<&str> = table.column_names().collect();

        let added = expand_validity_flags(&mut table).unwrap();

        assert_eq!(added, VALIDITY_FIELD_COUNT);
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(&names[..original.len()], original.as_slice());
        let expected: Vec<&str> = GPS_VALIDITY_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(&names[original.len()..], expected.as_slice());

        let fix_type: Vec<Cell> = table.column("fix_type").unwrap().collect();
        assert_eq!(fix_type, vec![Cell::Unsigned(1), Cell::Unsigned(0)]);
        let invalid_llh: Vec<Cell> = table.column("invalid_llh").unwrap().collect();
        assert_eq!(invalid_llh, vec![Cell::Unsigned(0), Cell::Unsigned(1)]);
        let source: Vec<Cell> = table.column(VALID_FLAGS_COLUMN).unwrap().collect();
        assert_eq!(source, vec![Cell::Unsigned(0x109), Cell::Unsigned(0x0008_0000)]);
    }

    #[test]
    fn expand__empty_gps_table__then_header_only_columns() {
        let mut table = gps_table(&[]);
        assert_eq!(expand_validity_flags(&mut table).unwrap(), VALIDITY_FIELD_COUNT);
        assert_eq!(table.width(), GpsFrame::SCHEMA.len() + VALIDITY_FIELD_COUNT);
        assert!(table.is_empty());
    }

    #[test]
    fn expand__sensor_table__then_no_op() {
        let frames = vec![Frame::from(SensorFrame::default())];
        let mut table = FrameTable::from_frames(FrameKind::Sensor, &frames).unwrap();
        let before = table.clone();

        assert_eq!(expand_validity_flags(&mut table).unwrap(), 0);
        assert_eq!(table, before);
    }

    #[test]
    fn expand__twice__then_duplicate_column_and_unchanged() {
        let mut table = gps_table(&[0x1]);
        expand_validity_flags(&mut table).unwrap();
        let before = table.clone();

        let err = expand_validity_flags(&mut table).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn("date_valid")));
        assert_eq!(table, before);
    }

    proptest! {
        #[test]
        fn extract__any_flags__then_mask_and_shift(flags in any::<u32>()) {
            for (field, (name, value)) in GPS_VALIDITY_FIELDS.iter().zip(ValidityFlags(flags).decompose()) {
                prop_assert_eq!(field.name, name);
                prop_assert_eq!(value, (flags & field.mask) >> field.mask.trailing_zeros());
            }
        }

        #[test]
        fn expand__rows_independent(flags in proptest::collection::vec(any::<u32>(), 0..16)) {
            let mut table = gps_table(&flags);
            expand_validity_flags(&mut table).unwrap();

            for (row, &packed) in flags.iter().enumerate() {
                for field in GPS_VALIDITY_FIELDS {
                    let index = table.column_index(field.name).unwrap();
                    prop_assert_eq!(
                        table.row(row).unwrap()[index],
                        Cell::Unsigned(u64::from(field.extract(packed)))
                    );
                }
            }
        }
    }
}
