//! Quartet Format - Inspection and repair of Quartet tracker assets
//!
//! Quartet is a four-channel sample tracker format from the Atari ST era. A
//! piece of music is made of an instrument bank (`.set`, up to 20 unsigned
//! 8-bit PCM samples behind a fixed-slot offset table) and one or more songs
//! (`.4v`, one command stream per channel). Both are frequently bundled in a
//! `.4q` or `.quar` container.
//!
//! This crate never touches the filesystem. Callers hand in byte buffers and
//! receive decoded, validated structures together with a [`Report`] that
//! lists every repair that was applied.
//!
//! # Instrument banks
//!
//! The declared slot count and offset table of a bank are only trusted as
//! hints. [`analyze_instrument_set`] walks the byte layout, rejects
//! overlapping instruments, recognizes embedded AVR sample headers and
//! recovers instruments whose table entry was lost while their PCM survived.
//!
//! # Songs
//!
//! [`validate_song`] decodes the four channel programs, replays them with a
//! loop stack and computes per-channel durations in ticks. Structurally
//! impossible programs (infinite loops, notes without a voice, lengths that
//! are not a multiple of the tempo) are rejected.
//!
//! # Example
//!
//! ```ignore
//! use quartet_format::{analyze_instrument_set, validate_song, AnalyzeOptions};
//!
//! let (vset, vset_report) = analyze_instrument_set(&set_bytes, &AnalyzeOptions::default())?;
//! let (song, song_report) = validate_song(&song_bytes, Some(vset.instrument_count()))?;
//!
//! if vset_report.is_modified() || song_report.is_modified() {
//!     println!("{} modifications were required", vset_report.fixes.len() + song_report.fixes.len());
//! }
//! ```

pub mod charset;
pub mod codec;
pub mod container;
pub mod error;
pub mod report;
pub mod song;
pub mod vset;

pub use container::{demux, Bundle, ContainerKind};
pub use error::{QuartetError, QuartetResult, Structure};
pub use report::{Fix, Report, Warning};
pub use song::{validate_song, Channel, Command, SequenceEvent, SequenceValidator, Song};
pub use vset::{
    analyze_instrument_set, Instrument, InstrumentSet, SampleHeader, SampleHeaderState, Sniff,
};

use serde::{Deserialize, Serialize};

/// Number of instrument slots in a bank.
pub const MAX_SLOTS: usize = 20;

/// Size of the instrument bank header (rate, count, names, offsets).
pub const VSET_HEADER_SIZE: usize = 222;

/// Smallest gap that may hold a discovered instrument.
pub const MIN_INSTRUMENT_SIZE: usize = 28;

/// Largest accepted instrument payload.
pub const MAX_INSTRUMENT_SIZE: usize = 128 << 10;

/// Distance between an embedded sample header and the instrument prefix.
pub const SAMPLE_HEADER_SNIFF: usize = 120;

/// Size of one channel program record.
pub const SEQUENCE_RECORD_SIZE: usize = 12;

/// Size of the song header.
pub const SONG_HEADER_SIZE: usize = 16;

/// Number of channels in a song.
pub const NUM_CHANNELS: usize = 4;

/// Crate version for report identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How aggressively analysis repairs what it finds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report problems; invalid embedded sample headers are dropped.
    #[default]
    Check,
    /// Normalize embedded sample headers to the mono unsigned 8-bit subset.
    Fix,
}

/// Options for instrument bank analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Repair mode.
    pub mode: Mode,
}

impl AnalyzeOptions {
    /// Options for fix mode.
    pub fn fix() -> Self {
        Self { mode: Mode::Fix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_mode_is_check() {
        assert_eq!(AnalyzeOptions::default().mode, Mode::Check);
        assert_eq!(AnalyzeOptions::fix().mode, Mode::Fix);
    }
}
