//! Instrument slots.
//!
//! An instrument is stored as an 8-byte prefix followed by unsigned 8-bit
//! PCM. Both prefix fields are 16.16 fixed-point with the value in the high
//! word; a loop field of `0xFFFFFFFF` means "no loop".

use std::fmt;

use serde::{Deserialize, Serialize};

use super::header::{VsetHeader, NAME_LEN};
use super::sample_header::SampleHeader;
use crate::charset::decode_name;
use crate::codec::{fp16_to_int, int_to_fp16, put_u32, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::{MAX_INSTRUMENT_SIZE, MAX_SLOTS, SAMPLE_HEADER_SNIFF};

/// Loop field value meaning "no loop".
pub const NO_LOOP: u32 = 0xFFFF_FFFF;

/// Size of the loop/size prefix.
pub const PREFIX_SIZE: usize = 8;

/// Raw loop/size prefix preceding an instrument's PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentPrefix {
    pub loop_raw: u32,
    pub size_raw: u32,
}

impl FixedRecord for InstrumentPrefix {
    const SIZE: usize = PREFIX_SIZE;
    const STRUCTURE: Structure = Structure::Instrument;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        let mut r = Reader::new(data, Self::STRUCTURE);
        Ok(Self {
            loop_raw: r.u32()?,
            size_raw: r.u32()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        put_u32(out, self.loop_raw);
        put_u32(out, self.size_raw);
    }
}

impl InstrumentPrefix {
    /// Build a prefix from integer values; a zero loop is written as "no loop".
    pub fn new(size: u16, loop_len: u16) -> Self {
        Self {
            loop_raw: if loop_len == 0 {
                NO_LOOP
            } else {
                int_to_fp16(loop_len)
            },
            size_raw: int_to_fp16(size),
        }
    }
}

/// Embedded sample header status of an instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleHeaderState {
    /// Not looked for yet.
    #[default]
    Untested,
    /// No header in front of the instrument.
    Absent,
    /// An almost-valid signature was seen; treated as absent.
    NearMiss,
    /// A valid header sits in front of the instrument.
    Present {
        /// The decoded header.
        header: SampleHeader,
    },
}

impl SampleHeaderState {
    /// The accepted header, if any.
    pub fn header(&self) -> Option<&SampleHeader> {
        match self {
            Self::Present { header } => Some(header),
            _ => None,
        }
    }

    /// Whether the header region belongs to the instrument.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// One slot of the instrument table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Slot index, 0..20.
    pub slot: u8,
    /// Raw 7-byte name.
    pub name: [u8; NAME_LEN],
    /// Offset of the first PCM byte (prefix offset + 8).
    pub addr: usize,
    /// PCM size in bytes.
    pub size: usize,
    /// Loop length in bytes, 0 without loop.
    pub loop_len: usize,
    /// Embedded sample header status.
    pub sample_header: SampleHeaderState,
}

impl Instrument {
    /// Create and validate an instrument against a buffer of `data_len` bytes.
    pub fn new(
        slot: usize,
        name: [u8; NAME_LEN],
        data_len: usize,
        addr: usize,
        size: usize,
        loop_len: usize,
    ) -> QuartetResult<Self> {
        let fail = |message: String| {
            Err(QuartetError::format_at(
                Structure::Instrument,
                format!("I#{:02} {}", slot, message),
                addr.saturating_sub(PREFIX_SIZE),
            ))
        };

        if slot >= MAX_SLOTS {
            return fail("out of range".to_string());
        }
        if addr & !0xFF_FFFE != 0 {
            return fail(format!("odd address -- {}", addr));
        }
        if addr < PREFIX_SIZE || addr >= data_len {
            return fail(format!(
                "start address out of range -- {} >= {}",
                addr, data_len
            ));
        }
        if size == 0 || size > MAX_INSTRUMENT_SIZE {
            return fail(format!("size out of range -- {}", size));
        }
        if addr + size > data_len + (data_len & 1) {
            return fail(format!(
                "end address out of range -- {} > {}",
                addr + size,
                data_len
            ));
        }
        if loop_len > size {
            return fail(format!("loop out of range -- {} > {}", loop_len, size));
        }

        Ok(Self {
            slot: slot as u8,
            name,
            addr,
            size,
            loop_len,
            sample_header: SampleHeaderState::Untested,
        })
    }

    /// Decode slot `slot` from the bank header and data.
    pub fn decode(slot: usize, header: &VsetHeader, data: &[u8]) -> QuartetResult<Self> {
        if slot >= MAX_SLOTS {
            return Err(QuartetError::format(
                Structure::InstrumentSet,
                format!("I#{:02} out of range", slot),
            ));
        }
        Self::decode_at(slot, header.names[slot], header.offsets[slot] as usize, data)
    }

    /// Decode an instrument whose loop/size prefix sits at `offset`.
    pub fn decode_at(
        slot: usize,
        name: [u8; NAME_LEN],
        offset: usize,
        data: &[u8],
    ) -> QuartetResult<Self> {
        let prefix = InstrumentPrefix::decode_at(data, offset).map_err(|_| {
            QuartetError::format_at(
                Structure::Instrument,
                format!(
                    "I#{:02}: prefix out of range -- {} > {}",
                    slot,
                    offset + PREFIX_SIZE,
                    data.len()
                ),
                offset,
            )
        })?;

        let loop_raw = if prefix.loop_raw == NO_LOOP {
            0
        } else {
            prefix.loop_raw
        };
        let size = fp16_to_int(prefix.size_raw).ok_or_else(|| {
            QuartetError::format_at(
                Structure::Instrument,
                format!(
                    "I#{:02}: invalid size (LSW not 0) -- {:08x}",
                    slot, prefix.size_raw
                ),
                offset + 4,
            )
        })?;
        let loop_len = fp16_to_int(loop_raw).ok_or_else(|| {
            QuartetError::format_at(
                Structure::Instrument,
                format!("I#{:02}: invalid loop (LSW not 0) -- {:08x}", slot, loop_raw),
                offset,
            )
        })?;

        Self::new(
            slot,
            name,
            data.len(),
            offset + PREFIX_SIZE,
            size as usize,
            loop_len as usize,
        )
    }

    /// Offset of the loop/size prefix.
    pub fn prefix_offset(&self) -> usize {
        self.addr - PREFIX_SIZE
    }

    /// First byte owned by the instrument, embedded header included.
    pub fn region_start(&self) -> usize {
        if self.sample_header.is_present() {
            self.prefix_offset() - SAMPLE_HEADER_SNIFF
        } else {
            self.prefix_offset()
        }
    }

    /// One past the last PCM byte.
    pub fn end(&self) -> usize {
        self.addr + self.size
    }

    /// Whether the instrument only fits thanks to the odd-length padding byte.
    pub fn needs_padding(&self, data_len: usize) -> bool {
        self.end() > data_len
    }

    /// Same byte range and loop as `other`.
    pub fn same_layout(&self, other: &Instrument) -> bool {
        self.addr == other.addr && self.size == other.size && self.loop_len == other.loop_len
    }

    /// Name decoded from the Atari charset.
    pub fn display_name(&self) -> String {
        decode_name(&self.name)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = crate::charset::decode_atari(&self.name[..6]);
        write!(
            f,
            "I#{:02} {:>8} [{:06}+{:06}-{:06}] ",
            self.slot,
            format!("'{}'", short),
            self.addr,
            self.size,
            self.loop_len
        )?;
        match &self.sample_header {
            SampleHeaderState::Present { header } => write!(f, "{}", header),
            SampleHeaderState::NearMiss => write!(f, "AVR?"),
            _ => write!(f, "-"),
        }
    }
}
