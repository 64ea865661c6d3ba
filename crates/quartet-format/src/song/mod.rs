//! Songs (`.4v`).
//!
//! A song is a 16-byte header followed by four channel programs of 12-byte
//! records, each closed by an End command.

mod channel;
mod event;
mod header;
mod parse;
mod validator;


use std::fmt;

use serde::Serialize;

pub use channel::Channel;
pub use event::{
    note_to_step, step_to_note, Command, SequenceEvent, SequenceRecord, NOTE_MAX, NOTE_MIN,
};
pub use header::SongHeader;
pub use validator::{LoopFrame, SequenceValidator};

use crate::codec::FixedRecord;
use crate::error::{QuartetError, QuartetResult};
use crate::report::Report;
use crate::{MAX_SLOTS, NUM_CHANNELS};

/// A decoded and replayed song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    pub header: SongHeader,
    pub channels: [Channel; NUM_CHANNELS],
    /// Duration in ticks: the longest channel.
    pub ticks: u64,
    #[serde(skip)]
    usage: [u32; MAX_SLOTS],
}

impl Song {
    /// Decode and validate a song buffer.
    ///
    /// `declared_count` is the instrument count of the bank the song plays
    /// with; without it voice numbers are only checked against the slot
    /// table size.
    pub fn analyze(
        data: &[u8],
        declared_count: Option<usize>,
        report: &mut Report,
    ) -> QuartetResult<Self> {
        let (header, mut channels) = parse::parse(data, report)?;

        let mut validator = SequenceValidator::new(header.tempo, declared_count);
        for chan in channels.iter_mut() {
            validator.replay(chan, report)?;
        }
        let ticks = validator.finish(&channels, report);

        let song = Self {
            header,
            channels,
            ticks,
            usage: *validator.usage(),
        };
        if ticks == 0 {
            return Err(QuartetError::EmptySong {
                song: song.to_string(),
            });
        }
        Ok(song)
    }

    /// Ticks per row.
    pub fn tempo(&self) -> u16 {
        self.header.tempo
    }

    /// Duration in rows.
    pub fn rows(&self) -> u64 {
        self.ticks / self.header.tempo.max(1) as u64
    }

    /// Play count of each instrument slot.
    pub fn instrument_usage(&self) -> &[u32; MAX_SLOTS] {
        &self.usage
    }

    /// Slots played at least once.
    pub fn used_instruments(&self) -> Vec<usize> {
        (0..MAX_SLOTS).filter(|&i| self.usage[i] > 0).collect()
    }

    /// Re-encode the header and the cleaned channel programs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_vec();
        for chan in &self.channels {
            for ev in &chan.events {
                ev.to_record().encode(&mut out);
            }
        }
        out
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sng: {:2}kHz / {} / {} / {}:{}\n   ",
            self.header.rate_khz,
            self.header.measure,
            self.header.tempo,
            self.header.time_signature.0,
            self.header.time_signature.1
        )?;
        for chan in &self.channels {
            write!(f, " {}", chan)?;
        }
        Ok(())
    }
}

/// Decode and validate a song and return it with its report.
pub fn validate_song(data: &[u8], declared_count: Option<usize>) -> QuartetResult<(Song, Report)> {
    let mut report = Report::default();
    let song = Song::analyze(data, declared_count, &mut report)?;
    Ok((song, report))
}

/// Encode a song from a header and per-channel event lists.
///
/// Events are written as given; End commands are not added.
pub fn build_song(header: &SongHeader, channels: &[&[SequenceEvent]]) -> Vec<u8> {
    let mut out = header.to_vec();
    for events in channels {
        for ev in events.iter() {
            ev.to_record().encode(&mut out);
        }
    }
    out
}
