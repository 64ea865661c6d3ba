//! Reconciliation of the offset table with the byte layout.
//!
//! The declared offsets are hints. Each pass sorts the known instruments by
//! address, checks the gaps between them (the bank header in front, the end
//! of the buffer behind) and then tries to fill one gap with an instrument
//! for the lowest free slot. A discovery changes every gap after it, so the
//! walk restarts until a pass finds nothing.

use std::fmt;

use super::instrument::{Instrument, SampleHeaderState, PREFIX_SIZE};
use super::sample_header::{sniff, SampleHeader, Sniff, AVR_SIGNATURE};
use super::InstrumentSet;
use crate::error::{QuartetError, QuartetResult};
use crate::report::Report;
use crate::{Mode, MAX_SLOTS, MIN_INSTRUMENT_SIZE, SAMPLE_HEADER_SNIFF, VSET_HEADER_SIZE};

/// Upper bound on walks: each productive pass fills one of the 20 slots.
const MAX_PASSES: usize = MAX_SLOTS + 1;

/// A byte range claimed by the header, an instrument or the buffer end.
#[derive(Debug, Clone, Copy)]
struct Region {
    slot: Option<u8>,
    is_end: bool,
    begin: usize,
    end: usize,
}

impl Region {
    fn head() -> Self {
        Self {
            slot: None,
            is_end: false,
            begin: 0,
            end: VSET_HEADER_SIZE,
        }
    }

    fn end_of(len: usize) -> Self {
        let end = len + (len & 1);
        Self {
            slot: None,
            is_end: true,
            begin: end,
            end,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(slot) => write!(f, "I#{:02} ", slot)?,
            None if self.is_end => write!(f, "END  ")?,
            None => write!(f, "HEAD ")?,
        }
        write!(
            f,
            "{:06}:{:06} +{}",
            self.begin,
            self.end,
            self.end - self.begin
        )
    }
}

/// Unclaimed bytes between two regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Gap {
    start: usize,
    end: usize,
}

impl Gap {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn holds(&self, inst: &Instrument) -> bool {
        inst.region_start() >= self.start && inst.end() <= self.end
    }
}

pub(super) fn check_and_discover(set: &mut InstrumentSet, report: &mut Report) -> QuartetResult<()> {
    warn_duplicates(set, report);

    // Logged after the next walk so the line shows the probed sample header.
    let mut added: Option<usize> = None;
    for pass in 0..MAX_PASSES {
        let gaps = walk(set, report)?;
        if let Some(inst) = added.take().and_then(|slot| set.slots[slot].as_ref()) {
            report.fix(format!("Added {}", inst));
        }
        let free: Vec<usize> = (0..MAX_SLOTS).filter(|&i| set.slots[i].is_none()).collect();
        if free.is_empty() {
            tracing::trace!(pass, "all slots populated");
            return Ok(());
        }
        match discover(set, &free, &gaps) {
            Some(inst) => {
                let slot = inst.slot as usize;
                set.slots[slot] = Some(inst);
                added = Some(slot);
            }
            None => {
                tracing::trace!(pass, gaps = gaps.len(), "discovery converged");
                return Ok(());
            }
        }
    }
    Err(QuartetError::DiscoveryDiverged {
        passes: MAX_PASSES,
    })
}

fn sorted_slots(set: &InstrumentSet) -> Vec<usize> {
    let mut order: Vec<usize> = (0..MAX_SLOTS).filter(|&i| set.slots[i].is_some()).collect();
    order.sort_by_key(|&i| {
        let start = set.slots[i].as_ref().map_or(0, Instrument::region_start);
        (start, i)
    });
    order
}

fn warn_duplicates(set: &InstrumentSet, report: &mut Report) {
    let ordered: Vec<&Instrument> = sorted_slots(set)
        .into_iter()
        .filter_map(|i| set.slots[i].as_ref())
        .collect();
    for pair in ordered.windows(2) {
        if pair[0].same_layout(pair[1]) {
            report.warn_at(
                format!("I#{:02} and I#{:02} are duplicates", pair[0].slot, pair[1].slot),
                Some(pair[1].prefix_offset()),
            );
        }
    }
}

/// Check every gap for overlaps, resolving sample headers on the way.
fn walk(set: &mut InstrumentSet, report: &mut Report) -> QuartetResult<Vec<Gap>> {
    let order = sorted_slots(set);
    let mut gaps = Vec::with_capacity(order.len() + 1);
    let mut prev = Region::head();
    let mut prev_slot: Option<usize> = None;

    for k in 0..=order.len() {
        let mut cur = match order.get(k) {
            Some(&slot) => {
                let Some(inst) = set.slots[slot].as_ref() else {
                    continue;
                };
                let duplicate = prev_slot
                    .and_then(|p| set.slots[p].as_ref())
                    .is_some_and(|p| p.same_layout(inst));
                if duplicate {
                    continue;
                }
                Region {
                    slot: Some(inst.slot),
                    is_end: false,
                    begin: inst.region_start(),
                    end: inst.end(),
                }
            }
            None => Region::end_of(set.data.len()),
        };

        if cur.begin < prev.end {
            return Err(QuartetError::Overlap {
                overlap: prev.end - cur.begin,
                previous: prev.to_string(),
                current: cur.to_string(),
            });
        }

        if let Some(&slot) = order.get(k) {
            let room = cur.begin - prev.end;
            if let Some(inst) = set.slots[slot].as_mut() {
                if inst.sample_header == SampleHeaderState::Untested {
                    inst.sample_header = probe_sample_header(&set.data, inst, room, set.mode, report);
                    if inst.sample_header.is_present() {
                        cur.begin -= SAMPLE_HEADER_SNIFF;
                    }
                }
            }
            prev_slot = Some(slot);
        }

        gaps.push(Gap {
            start: prev.end,
            end: cur.begin,
        });
        prev = cur;
    }
    Ok(gaps)
}

/// Look for an embedded sample header in the `room` bytes in front of `inst`.
fn probe_sample_header(
    data: &[u8],
    inst: &Instrument,
    room: usize,
    mode: Mode,
    report: &mut Report,
) -> SampleHeaderState {
    let prefix = inst.prefix_offset();
    report.scoped(format!("I#{:02}", inst.slot), |report| {
        match sniff(data, prefix, room) {
            Sniff::Rejected => SampleHeaderState::Absent,
            Sniff::NearMiss => {
                report.warn_at(
                    "near-miss sample header signature, ignored",
                    Some(prefix - SAMPLE_HEADER_SNIFF),
                );
                SampleHeaderState::NearMiss
            }
            Sniff::Confirmed => {
                let window = data[prefix - SAMPLE_HEADER_SNIFF..prefix + PREFIX_SIZE].to_vec();
                let decoded = SampleHeader::decode(&window).and_then(|mut header| {
                    header.check(mode, report)?;
                    Ok(header)
                });
                match decoded {
                    Ok(header) => {
                        tracing::debug!(subject = %report.subject, "{}", header);
                        SampleHeaderState::Present { header }
                    }
                    Err(err) => {
                        report.warn_at(err.to_string(), Some(prefix - SAMPLE_HEADER_SNIFF));
                        SampleHeaderState::Absent
                    }
                }
            }
        }
    })
}

/// Find an instrument for one of the `free` slots inside one of `gaps`.
///
/// Offset table entries are tried first, for every free slot, so an intact
/// entry keeps its instrument even when a lower slot lost its own. Failing
/// that, the start of each gap is tried for the lowest free slot, directly
/// or behind an embedded sample header, which recovers an instrument whose
/// table entry was wiped.
fn discover(set: &InstrumentSet, free: &[usize], gaps: &[Gap]) -> Option<Instrument> {
    let by_hint = free.iter().find_map(|&slot| {
        let hint = set.offset_hint(slot);
        gaps.iter().find_map(|gap| try_candidate(set, slot, hint, gap))
    });
    if by_hint.is_some() {
        return by_hint;
    }
    let &slot = free.first()?;
    gaps.iter().find_map(|gap| {
        let start = gap.start + (gap.start & 1);
        try_candidate(set, slot, start, gap).or_else(|| {
            let behind_header = set.data.get(start..start + 4) == Some(&AVR_SIGNATURE[..]);
            if behind_header {
                try_candidate(set, slot, start + SAMPLE_HEADER_SNIFF, gap)
            } else {
                None
            }
        })
    })
}

fn try_candidate(set: &InstrumentSet, slot: usize, offset: usize, gap: &Gap) -> Option<Instrument> {
    if gap.len() < MIN_INSTRUMENT_SIZE {
        return None;
    }
    if offset & !0xFF_FFFE != 0 {
        return None;
    }
    if offset < gap.start || offset + MIN_INSTRUMENT_SIZE > gap.end {
        return None;
    }
    match Instrument::decode_at(slot, set.header.names[slot], offset, &set.data) {
        Ok(inst) if gap.holds(&inst) => {
            tracing::debug!(slot, offset, "candidate accepted");
            Some(inst)
        }
        Ok(inst) => {
            tracing::trace!(
                slot,
                offset,
                end = inst.end(),
                gap_end = gap.end,
                "candidate spills out of gap"
            );
            None
        }
        Err(err) => {
            tracing::trace!(slot, offset, %err, "candidate rejected");
            None
        }
    }
}
