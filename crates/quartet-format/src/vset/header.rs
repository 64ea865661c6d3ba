//! Instrument bank header.
//!
//! | offset | type       | name                                  |
//! |--------|------------|---------------------------------------|
//! | 0      | u8         | sampling rate (kHz)                   |
//! | 1      | u8         | instrument count + 1                  |
//! | 2      | char[7]×20 | instrument names                      |
//! | 142    | u32×20     | instrument offsets (to loop/size)     |
//! | 222    |            | first instrument                      |

use crate::codec::{put_u32, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::{MAX_SLOTS, VSET_HEADER_SIZE};

/// Length of an instrument name field.
pub const NAME_LEN: usize = 7;

/// Raw instrument bank header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsetHeader {
    /// Sampling rate code in kHz.
    pub rate_khz: u8,
    /// Stored instrument count (one more than the real count).
    pub count_plus_one: u8,
    /// Instrument names.
    pub names: [[u8; NAME_LEN]; MAX_SLOTS],
    /// Offsets of each instrument's loop/size prefix.
    pub offsets: [u32; MAX_SLOTS],
}

impl VsetHeader {
    /// Declared instrument count.
    pub fn declared_count(&self) -> i32 {
        self.count_plus_one as i32 - 1
    }

    /// Check the header ranges.
    pub fn validate(&self) -> QuartetResult<()> {
        if !(4..=20).contains(&self.rate_khz) {
            return Err(QuartetError::format_at(
                Structure::InstrumentSet,
                format!("sampling rate out of range -- {}", self.rate_khz),
                0,
            ));
        }
        let count = self.declared_count();
        if !(1..=MAX_SLOTS as i32).contains(&count) {
            return Err(QuartetError::format_at(
                Structure::InstrumentSet,
                format!("instrument count out of range -- {}", count),
                1,
            ));
        }
        Ok(())
    }
}

impl FixedRecord for VsetHeader {
    const SIZE: usize = VSET_HEADER_SIZE;
    const STRUCTURE: Structure = Structure::InstrumentSet;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        if data.len() < Self::SIZE {
            return Err(QuartetError::format(
                Structure::InstrumentSet,
                format!(
                    "not enough data for vset header -- {}",
                    data.len() as i64 - Self::SIZE as i64
                ),
            ));
        }
        let mut r = Reader::new(data, Self::STRUCTURE);
        let rate_khz = r.u8()?;
        let count_plus_one = r.u8()?;
        let mut names = [[0u8; NAME_LEN]; MAX_SLOTS];
        for name in names.iter_mut() {
            *name = r.array()?;
        }
        let mut offsets = [0u32; MAX_SLOTS];
        for offset in offsets.iter_mut() {
            *offset = r.u32()?;
        }
        Ok(Self {
            rate_khz,
            count_plus_one,
            names,
            offsets,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.rate_khz);
        out.push(self.count_plus_one);
        for name in &self.names {
            out.extend_from_slice(name);
        }
        for &offset in &self.offsets {
            put_u32(out, offset);
        }
    }
}
