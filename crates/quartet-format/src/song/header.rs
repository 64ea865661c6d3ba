//! Song header.
//!
//! | offset | type  | name                      |
//! |--------|-------|---------------------------|
//! | 0      | u16   | sampling rate (kHz)       |
//! | 2      | u16   | measure                   |
//! | 4      | u16   | tempo (ticks per row)     |
//! | 6      | u8    | time signature numerator  |
//! | 7      | u8    | time signature denominator|
//! | 8      | u8[8] | reserved, zero            |

use serde::Serialize;

use crate::codec::{put_u16, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::report::Report;
use crate::SONG_HEADER_SIZE;

/// Raw song header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongHeader {
    pub rate_khz: u16,
    pub measure: u16,
    pub tempo: u16,
    pub time_signature: (u8, u8),
    #[serde(skip)]
    pub reserved: [u8; 8],
}

impl SongHeader {
    /// Check the rate and tempo ranges. Nonzero reserved bytes are a warning.
    pub fn validate(&self, report: &mut Report) -> QuartetResult<()> {
        if !(4..=20).contains(&self.rate_khz) {
            return Err(QuartetError::format_at(
                Structure::Song,
                format!("sampling rate out of range -- {}", self.rate_khz),
                0,
            ));
        }
        if !(4..=40).contains(&self.tempo) {
            return Err(QuartetError::format_at(
                Structure::Song,
                format!("tempo out of range -- {}", self.tempo),
                4,
            ));
        }
        if self.reserved.iter().any(|&b| b != 0) {
            report.warn_at("reserved data not nil", Some(8));
        }
        Ok(())
    }
}

impl FixedRecord for SongHeader {
    const SIZE: usize = SONG_HEADER_SIZE;
    const STRUCTURE: Structure = Structure::Song;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        let mut r = Reader::new(data, Self::STRUCTURE);
        Ok(Self {
            rate_khz: r.u16()?,
            measure: r.u16()?,
            tempo: r.u16()?,
            time_signature: (r.u8()?, r.u8()?),
            reserved: r.array()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        put_u16(out, self.rate_khz);
        put_u16(out, self.measure);
        put_u16(out, self.tempo);
        out.push(self.time_signature.0);
        out.push(self.time_signature.1);
        out.extend_from_slice(&self.reserved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(rate: u16, tempo: u16) -> SongHeader {
        SongHeader {
            rate_khz: rate,
            measure: 64,
            tempo,
            time_signature: (4, 4),
            reserved: [0; 8],
        }
    }

    #[test]
    fn test_layout() {
        let bytes = header(8, 4).to_vec();
        assert_eq!(bytes.len(), SONG_HEADER_SIZE);
        assert_eq!(&bytes[..8], &[0, 8, 0, 64, 0, 4, 4, 4]);
        assert_eq!(SongHeader::decode(&bytes).unwrap(), header(8, 4));
    }

    #[test]
    fn test_ranges() {
        let mut report = Report::default();
        assert!(header(3, 4).validate(&mut report).is_err());
        assert!(header(21, 4).validate(&mut report).is_err());
        assert!(header(8, 3).validate(&mut report).is_err());
        assert!(header(8, 41).validate(&mut report).is_err());
        header(20, 40).validate(&mut report).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_reserved_bytes_warn() {
        let mut hd = header(8, 4);
        hd.reserved[3] = 1;
        let mut report = Report::default();
        hd.validate(&mut report).unwrap();
        assert_eq!(report.warnings.len(), 1);
    }
}
