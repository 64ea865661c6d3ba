//! Embedded AVR sample headers.
//!
//! Some banks keep the AVR header of the original sample file in front of
//! the instrument. The 128-byte header ends where the PCM used to start, so
//! its last 8 bytes are overwritten by the instrument's loop/size prefix and
//! its signature sits 120 bytes before that prefix.
//!
//! | offset | type    | name                                          |
//! |--------|---------|-----------------------------------------------|
//! | 0      | char[4] | signature `2BIT`                              |
//! | 4      | char[8] | sample name                                   |
//! | 12     | u16     | mono/stereo (0 / 0xFFFF)                      |
//! | 14     | u16     | resolution (8, 12 or 16)                      |
//! | 16     | u16     | signed (0 / 0xFFFF)                           |
//! | 18     | u16     | loop (0 / 0xFFFF)                             |
//! | 20     | u16     | MIDI note (0xFFnn, 0xFFFF for none)           |
//! | 22     | u8      | replay speed code (0..7, 0xFF for none)       |
//! | 23     | u24     | sample rate in Hz                             |
//! | 26     | u32     | size                                          |
//! | 30     | u32     | loop begin                                    |
//! | 34     | u32     | loop end                                      |
//! | 38     | u8[26]  | reserved                                      |
//! | 64     | u8[64]  | user data                                     |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{put_u16, put_u24, put_u32, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::report::Report;
use crate::{Mode, SAMPLE_HEADER_SNIFF};

/// Expected signature.
pub const AVR_SIGNATURE: &[u8; 4] = b"2BIT";

/// Full size of an AVR header.
pub const AVR_HEADER_SIZE: usize = 128;

/// Replay frequencies indexed by `speed code + 1`; index 0 means unset.
pub const REPLAY_SPEEDS: [u32; 9] = [0, 5485, 8084, 10971, 16168, 21942, 32336, 43885, 47261];

/// Result of looking for a sample header signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sniff {
    /// Exact `2BIT` signature.
    Confirmed,
    /// No signature or not enough room.
    Rejected,
    /// `?BIT`: almost a signature. Reported, never accepted.
    NearMiss,
}

/// Look for a sample header in front of the prefix starting at `prefix_start`.
///
/// `room` is the number of free bytes available in front of the prefix.
pub fn sniff(data: &[u8], prefix_start: usize, room: usize) -> Sniff {
    if room < SAMPLE_HEADER_SNIFF || prefix_start < SAMPLE_HEADER_SNIFF {
        return Sniff::Rejected;
    }
    let at = prefix_start - SAMPLE_HEADER_SNIFF;
    match data.get(at..at + 4) {
        Some(fcc) if fcc == AVR_SIGNATURE => Sniff::Confirmed,
        Some(fcc) if &fcc[1..] == b"BIT" => Sniff::NearMiss,
        _ => Sniff::Rejected,
    }
}

/// Raw 128-byte AVR header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHeaderRecord {
    pub signature: [u8; 4],
    pub name: [u8; 8],
    pub stereo: u16,
    pub resolution: u16,
    pub signed: u16,
    pub looping: u16,
    pub midi_note: u16,
    pub speed_code: u8,
    pub rate: u32,
    pub size: u32,
    pub loop_begin: u32,
    pub loop_end: u32,
    pub reserved: [u8; 26],
    pub user: [u8; 64],
}

impl FixedRecord for SampleHeaderRecord {
    const SIZE: usize = AVR_HEADER_SIZE;
    const STRUCTURE: Structure = Structure::SampleHeader;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        let mut r = Reader::new(data, Self::STRUCTURE);
        Ok(Self {
            signature: r.array()?,
            name: r.array()?,
            stereo: r.u16()?,
            resolution: r.u16()?,
            signed: r.u16()?,
            looping: r.u16()?,
            midi_note: r.u16()?,
            speed_code: r.u8()?,
            rate: r.u24()?,
            size: r.u32()?,
            loop_begin: r.u32()?,
            loop_end: r.u32()?,
            reserved: r.array()?,
            user: r.array()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.name);
        put_u16(out, self.stereo);
        put_u16(out, self.resolution);
        put_u16(out, self.signed);
        put_u16(out, self.looping);
        put_u16(out, self.midi_note);
        out.push(self.speed_code);
        put_u24(out, self.rate);
        put_u32(out, self.size);
        put_u32(out, self.loop_begin);
        put_u32(out, self.loop_end);
        out.extend_from_slice(&self.reserved);
        out.extend_from_slice(&self.user);
    }
}

fn flag(value: u16, what: &str) -> QuartetResult<bool> {
    match value {
        0 => Ok(false),
        0xFFFF => Ok(true),
        _ => Err(QuartetError::SampleHeader {
            message: format!("AVR invalid {} -- {}", what, value),
        }),
    }
}

/// Decoded and range-checked sample header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleHeader {
    /// Sample name (Atari charset, trimmed).
    pub name: String,
    /// 1 for mono, 2 for stereo.
    pub channels: u8,
    /// 8, 12 or 16.
    pub bit_width: u16,
    /// Signed PCM.
    pub signed: bool,
    /// Loop flag.
    pub has_loop: bool,
    /// Raw MIDI note word.
    pub midi_note: u16,
    /// Raw replay speed code byte.
    pub speed_code: u8,
    /// Frequency of the replay speed code, 0 when unset.
    pub speed_hz: u32,
    /// Explicit sample rate in Hz.
    pub sample_rate: u32,
    /// Size in bytes.
    pub size: u32,
    /// Loop begin.
    pub loop_begin: u32,
    /// Loop end.
    pub loop_end: u32,
    #[serde(skip)]
    record: Option<Box<SampleHeaderRecord>>,
}

impl SampleHeader {
    /// Decode a header from a 128-byte window.
    pub fn decode(window: &[u8]) -> QuartetResult<Self> {
        let record = SampleHeaderRecord::decode(window)?;
        if &record.signature != AVR_SIGNATURE {
            return Err(QuartetError::SampleHeader {
                message: "AVR missing signature".to_string(),
            });
        }
        let channels = if flag(record.stereo, "channel")? { 2 } else { 1 };
        if ![8, 12, 16].contains(&record.resolution) {
            return Err(QuartetError::SampleHeader {
                message: format!("AVR invalid width -- {}", record.resolution),
            });
        }
        let signed = flag(record.signed, "sign")?;
        let has_loop = flag(record.looping, "loop")?;

        let index = record.speed_code.wrapping_add(1) as usize;
        if index >= REPLAY_SPEEDS.len() {
            return Err(QuartetError::SampleHeader {
                message: format!("AVR invalid speed -- {}", index),
            });
        }
        if !(2000..=96000).contains(&record.rate) {
            return Err(QuartetError::SampleHeader {
                message: format!("AVR invalid sampling rate -- {}", record.rate),
            });
        }

        Ok(Self {
            name: crate::charset::decode_name(&record.name),
            channels,
            bit_width: record.resolution,
            signed,
            has_loop,
            midi_note: record.midi_note,
            speed_code: record.speed_code,
            speed_hz: REPLAY_SPEEDS[index],
            sample_rate: record.rate,
            size: record.size,
            loop_begin: record.loop_begin,
            loop_end: record.loop_end,
            record: Some(Box::new(record)),
        })
    }

    /// Loop length in bytes, 0 without loop.
    pub fn loop_len(&self) -> u32 {
        if self.has_loop {
            self.loop_end.saturating_sub(self.loop_begin)
        } else {
            0
        }
    }

    /// Replay speed code and explicit rate, when both are set and disagree.
    pub fn rate_conflict(&self) -> Option<(u32, u32)> {
        if self.speed_hz != 0 && self.speed_hz != self.sample_rate {
            Some((self.speed_hz, self.sample_rate))
        } else {
            None
        }
    }

    /// Check the header against the mono unsigned 8-bit subset.
    ///
    /// In [`Mode::Check`] a mismatch is an error; in [`Mode::Fix`] the header
    /// is normalized and each change is recorded as a fix.
    pub fn check(&mut self, mode: Mode, report: &mut Report) -> QuartetResult<()> {
        if self.channels != 1 {
            let message = format!("AVR invalid chans -- {}", self.channels);
            if mode == Mode::Check {
                return Err(QuartetError::SampleHeader { message });
            }
            report.fix(format!("{}, forced to mono", message));
            self.channels = 1;
        }
        if self.bit_width != 8 {
            let message = format!("AVR invalid width -- {}", self.bit_width);
            if mode == Mode::Check {
                return Err(QuartetError::SampleHeader { message });
            }
            report.fix(format!("{}, forced to 8 bits", message));
            self.bit_width = 8;
        }
        // Too many files get the sign flag wrong to reject them for it.
        if mode == Mode::Fix && self.signed {
            report.fix("AVR sign forced to unsigned");
            self.signed = false;
        }
        if let Some((speed, rate)) = self.rate_conflict() {
            tracing::debug!(
                subject = %report.subject,
                "AVR replay speed {} Hz disagrees with rate {} Hz",
                speed,
                rate
            );
        }
        Ok(())
    }

    /// Encode the header with its current (possibly normalized) fields.
    pub fn to_record(&self) -> SampleHeaderRecord {
        let base = self.record.as_deref().cloned();
        let (name, reserved, user) = match &base {
            Some(r) => (r.name, r.reserved, r.user),
            None => {
                let mut name = [0u8; 8];
                for (dst, src) in name.iter_mut().zip(self.name.bytes()) {
                    *dst = src;
                }
                (name, [0u8; 26], [0u8; 64])
            }
        };
        let bool_word = |b: bool| if b { 0xFFFF } else { 0 };
        SampleHeaderRecord {
            signature: *AVR_SIGNATURE,
            name,
            stereo: bool_word(self.channels == 2),
            resolution: self.bit_width,
            signed: bool_word(self.signed),
            looping: bool_word(self.has_loop),
            midi_note: self.midi_note,
            speed_code: self.speed_code,
            rate: self.sample_rate,
            size: self.size,
            loop_begin: self.loop_begin,
            loop_end: self.loop_end,
            reserved,
            user,
        }
    }
}

impl fmt::Display for SampleHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AVR<{}{}x{} {:06}-{:06} @{}>",
            if self.signed { 's' } else { 'u' },
            self.bit_width,
            self.channels,
            self.size,
            self.loop_len(),
            self.sample_rate
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A valid mono unsigned 8-bit header, 128 bytes.
    pub(crate) fn avr_bytes() -> Vec<u8> {
        let mut avr = vec![0u8; AVR_HEADER_SIZE];
        avr[0..4].copy_from_slice(AVR_SIGNATURE);
        avr[4..9].copy_from_slice(b"SNARE");
        avr[20..22].copy_from_slice(&0xFFFFu16.to_be_bytes());
        avr[14..16].copy_from_slice(&8u16.to_be_bytes());
        avr[22] = 0x01; // 8084 Hz
        avr[23..26].copy_from_slice(&8084u32.to_be_bytes()[1..]);
        avr[26..30].copy_from_slice(&16u32.to_be_bytes());
        avr
    }

    #[test]
    fn test_decode_valid() {
        let avr = SampleHeader::decode(&avr_bytes()).unwrap();
        assert_eq!(avr.name, "SNARE");
        assert_eq!(avr.channels, 1);
        assert_eq!(avr.bit_width, 8);
        assert!(!avr.signed);
        assert!(!avr.has_loop);
        assert_eq!(avr.speed_hz, 8084);
        assert_eq!(avr.sample_rate, 8084);
        assert_eq!(avr.rate_conflict(), None);
        assert_eq!(avr.to_string(), "AVR<u8x1 000016-000000 @8084>");
    }

    #[test]
    fn test_decode_rejects_bad_fields() {
        let cases: [(usize, &[u8]); 6] = [
            (0, b"1BIT"),
            (12, &[0x00, 0x01]),
            (14, &[0x00, 0x0A]),
            (16, &[0x12, 0x34]),
            (22, &[0x08]),
            (23, &[0x00, 0x00, 0x10]),
        ];
        for (at, bytes) in cases {
            let mut avr = avr_bytes();
            avr[at..at + bytes.len()].copy_from_slice(bytes);
            let err = SampleHeader::decode(&avr).unwrap_err();
            assert_eq!(err.structure(), Structure::SampleHeader, "offset {}", at);
        }
    }

    #[test]
    fn test_unset_speed_code() {
        let mut avr = avr_bytes();
        avr[22] = 0xFF;
        let avr = SampleHeader::decode(&avr).unwrap();
        assert_eq!(avr.speed_hz, 0);
        assert_eq!(avr.rate_conflict(), None);
    }

    #[test]
    fn test_rate_conflict_is_not_an_error() {
        let mut avr = avr_bytes();
        avr[22] = 0x03; // 16168 Hz
        let mut avr = SampleHeader::decode(&avr).unwrap();
        assert_eq!(avr.rate_conflict(), Some((16168, 8084)));
        let mut report = Report::new("");
        avr.check(Mode::Check, &mut report).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_check_mode_rejects_stereo() {
        let mut avr = avr_bytes();
        avr[12..14].copy_from_slice(&0xFFFFu16.to_be_bytes());
        let mut avr = SampleHeader::decode(&avr).unwrap();
        let mut report = Report::new("");
        let err = avr.check(Mode::Check, &mut report).unwrap_err();
        assert_eq!(err.to_string(), "sample header: AVR invalid chans -- 2");
    }

    #[test]
    fn test_fix_mode_normalizes() {
        let mut avr = avr_bytes();
        avr[12..14].copy_from_slice(&0xFFFFu16.to_be_bytes());
        avr[14..16].copy_from_slice(&16u16.to_be_bytes());
        avr[16..18].copy_from_slice(&0xFFFFu16.to_be_bytes());
        let mut avr = SampleHeader::decode(&avr).unwrap();
        let mut report = Report::new("");
        avr.check(Mode::Fix, &mut report).unwrap();
        assert_eq!(avr.channels, 1);
        assert_eq!(avr.bit_width, 8);
        assert!(!avr.signed);
        assert_eq!(report.fixes.len(), 3);

        let encoded = avr.to_record().to_vec();
        assert_eq!(encoded.len(), AVR_HEADER_SIZE);
        let mut again = SampleHeader::decode(&encoded).unwrap();
        let mut report = Report::new("");
        again.check(Mode::Fix, &mut report).unwrap();
        assert!(report.fixes.is_empty());
        assert_eq!(again.name, "SNARE");
    }

    #[test]
    fn test_sniff() {
        let mut data = vec![0u8; 300];
        data[100..104].copy_from_slice(b"2BIT");
        assert_eq!(sniff(&data, 220, 200), Sniff::Confirmed);
        assert_eq!(sniff(&data, 220, 119), Sniff::Rejected);
        data[100] = b'Z';
        assert_eq!(sniff(&data, 220, 200), Sniff::NearMiss);
        data[101] = b'Z';
        assert_eq!(sniff(&data, 220, 200), Sniff::Rejected);
        assert_eq!(sniff(&data, 50, 200), Sniff::Rejected);
    }
}
