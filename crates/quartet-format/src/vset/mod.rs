//! Instrument banks (`.set`).
//!
//! A bank is a 222-byte header followed by the instruments' PCM. The header's
//! count and offsets are read first; discovery then reconciles them with
//! the actual byte layout.

mod discover;
pub mod header;
pub mod instrument;
pub mod sample_header;

#[cfg(test)]
mod tests;

use serde::Serialize;

pub use header::{VsetHeader, NAME_LEN};
pub use instrument::{Instrument, InstrumentPrefix, SampleHeaderState, NO_LOOP, PREFIX_SIZE};
pub use sample_header::{sniff, SampleHeader, SampleHeaderRecord, Sniff, AVR_HEADER_SIZE};

use crate::codec::FixedRecord;
use crate::error::QuartetResult;
use crate::report::Report;
use crate::{AnalyzeOptions, Mode, MAX_SLOTS, SAMPLE_HEADER_SNIFF};

/// A decoded and repaired instrument bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSet {
    /// Sampling rate in kHz.
    pub rate_khz: u8,
    /// Instrument count stored in the header.
    pub declared_count: i32,
    header: VsetHeader,
    slots: [Option<Instrument>; MAX_SLOTS],
    mode: Mode,
    data: Vec<u8>,
}

/// Serializable overview of a bank.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSetSummary {
    pub rate_khz: u8,
    pub declared_count: i32,
    pub instrument_count: usize,
    pub size: usize,
    pub instruments: Vec<Instrument>,
}

impl InstrumentSet {
    /// Decode the header and declared instruments, then run discovery.
    pub fn analyze(
        data: &[u8],
        options: &AnalyzeOptions,
        report: &mut Report,
    ) -> QuartetResult<Self> {
        let header = VsetHeader::decode(data)?;
        header.validate()?;

        let mut slots: [Option<Instrument>; MAX_SLOTS] = Default::default();
        for (slot, entry) in slots
            .iter_mut()
            .enumerate()
            .take(header.declared_count() as usize)
        {
            *entry = Some(Instrument::decode(slot, &header, data)?);
        }

        let mut set = Self {
            rate_khz: header.rate_khz,
            declared_count: header.declared_count(),
            header,
            slots,
            mode: options.mode,
            data: data.to_vec(),
        };
        discover::check_and_discover(&mut set, report)?;

        let len = set.data.len();
        for inst in set.instruments() {
            if inst.needs_padding(len) {
                report.warn_at(
                    format!("I#{:02} saved by alignment", inst.slot),
                    Some(inst.end()),
                );
            }
        }
        tracing::debug!(
            subject = %report.subject,
            "{} instruments at {} kHz",
            set.instrument_count(),
            set.rate_khz
        );
        Ok(set)
    }

    /// Number of populated slots.
    pub fn instrument_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Populated slots in slot order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.slots.iter().flatten()
    }

    /// Instrument in `slot`, if any.
    pub fn slot(&self, slot: usize) -> Option<&Instrument> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// The decoded header as read from the input.
    pub fn header(&self) -> &VsetHeader {
        &self.header
    }

    /// Bytes of the analyzed bank.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample bytes of `slot`. The odd-length padding byte is not included.
    pub fn pcm(&self, slot: usize) -> Option<&[u8]> {
        let inst = self.slot(slot)?;
        let end = inst.end().min(self.data.len());
        self.data.get(inst.addr..end)
    }

    /// Re-encode the bank with the repaired count and offset table.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = self.header.clone();
        header.count_plus_one = (self.instrument_count() + 1) as u8;
        for inst in self.instruments() {
            header.offsets[inst.slot as usize] = inst.prefix_offset() as u32;
        }

        let mut out = self.data.clone();
        out[..VsetHeader::SIZE].copy_from_slice(&header.to_vec());

        if self.mode == Mode::Fix {
            for inst in self.instruments() {
                if let Some(avr) = inst.sample_header.header() {
                    let at = inst.region_start();
                    let record = avr.to_record().to_vec();
                    out[at..at + SAMPLE_HEADER_SNIFF]
                        .copy_from_slice(&record[..SAMPLE_HEADER_SNIFF]);
                }
            }
        }
        out
    }

    /// Serializable overview.
    pub fn summary(&self) -> InstrumentSetSummary {
        InstrumentSetSummary {
            rate_khz: self.rate_khz,
            declared_count: self.declared_count,
            instrument_count: self.instrument_count(),
            size: self.data.len(),
            instruments: self.instruments().cloned().collect(),
        }
    }

    /// Offset table entry of `slot` as read from the input.
    fn offset_hint(&self, slot: usize) -> usize {
        self.header.offsets[slot] as usize
    }
}

/// Analyze an instrument bank and return it with its report.
pub fn analyze_instrument_set(
    data: &[u8],
    options: &AnalyzeOptions,
) -> QuartetResult<(InstrumentSet, Report)> {
    let mut report = Report::default();
    let set = InstrumentSet::analyze(data, options, &mut report)?;
    Ok((set, report))
}

/// Encode a bank header followed by instruments at consecutive offsets.
///
/// Each entry is `(name, pcm, loop_len)`. Used to build fixtures and by
/// tools that assemble banks from scratch.
pub fn build_bank(rate_khz: u8, instruments: &[(&str, &[u8], u16)]) -> Vec<u8> {
    let mut header = VsetHeader {
        rate_khz,
        count_plus_one: (instruments.len() + 1) as u8,
        names: [[b' '; NAME_LEN]; MAX_SLOTS],
        offsets: [0; MAX_SLOTS],
    };
    let mut body = Vec::new();
    for (slot, (name, pcm, loop_len)) in instruments.iter().enumerate().take(MAX_SLOTS) {
        for (dst, src) in header.names[slot].iter_mut().zip(name.bytes()) {
            *dst = src;
        }
        header.offsets[slot] = (VsetHeader::SIZE + body.len()) as u32;
        InstrumentPrefix::new(pcm.len() as u16, *loop_len).encode(&mut body);
        body.extend_from_slice(pcm);
        if body.len() & 1 == 1 {
            body.push(0x80);
        }
    }
    let mut out = header.to_vec();
    out.extend_from_slice(&body);
    out
}
