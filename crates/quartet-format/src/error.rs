//! Error types for Quartet analysis.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Quartet operations.
pub type QuartetResult<T> = Result<T, QuartetError>;

/// The structure an error was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    /// `.4q` / `.quar` bundle.
    Container,
    /// Instrument bank header and layout.
    InstrumentSet,
    /// A single instrument slot.
    Instrument,
    /// Embedded AVR sample header.
    SampleHeader,
    /// Song header and song-wide checks.
    Song,
    /// A single 12-byte sequence record.
    Sequence,
    /// A channel program.
    Channel,
}

impl Structure {
    /// Returns the string representation for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::InstrumentSet => "instrument set",
            Self::Instrument => "instrument",
            Self::SampleHeader => "sample header",
            Self::Song => "song",
            Self::Sequence => "sequence",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while decoding or validating Quartet data.
///
/// Every variant is fatal for the structure it names. Non-fatal findings are
/// recorded in a [`Report`](crate::Report) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuartetError {
    /// Buffer too short or a field outside its legal range.
    #[error("{structure}: {message}")]
    Format {
        /// Structure being decoded.
        structure: Structure,
        /// Detailed error message.
        message: String,
        /// Byte offset where the error occurred (if applicable).
        offset: Option<usize>,
    },

    /// Two regions of the instrument bank claim the same bytes.
    #[error("instrument overlaps on its predecessor by {overlap} bytes\n>> {previous}\n>> {current}")]
    Overlap {
        /// Number of shared bytes.
        overlap: usize,
        /// Preceding region, e.g. `HEAD 000000:000222 +222`.
        previous: String,
        /// Overlapping region.
        current: String,
    },

    /// Embedded sample header present but invalid.
    #[error("sample header: {message}")]
    SampleHeader {
        /// Detailed error message.
        message: String,
    },

    /// Event length is not a multiple of the song tempo.
    #[error("length is not a multiple of tempo {tempo} -- {channel}{event}")]
    TempoMismatch {
        /// Song tempo.
        tempo: u16,
        /// Channel tag (`A`..`D`).
        channel: char,
        /// Offending event.
        event: String,
    },

    /// Play command before any voice was selected.
    #[error("no voice set -- {channel}{event}")]
    NoVoice {
        /// Channel tag.
        channel: char,
        /// Offending event.
        event: String,
    },

    /// Play command with a voice the instrument bank does not have.
    #[error("play with invalid voice #{voice} (bank has {count}) -- {channel}{event}")]
    VoiceOutOfRange {
        /// Channel tag.
        channel: char,
        /// Selected voice.
        voice: usize,
        /// Instrument count of the bank.
        count: usize,
        /// Offending event.
        event: String,
    },

    /// Sequence record with an unknown command code.
    #[error("unknown command -- {printable:?} {code:04X}")]
    UnknownCommand {
        /// Raw command word.
        code: u16,
        /// Command word rendered as a character when possible.
        printable: char,
    },

    /// Sequence record whose fields are invalid for its command.
    #[error("{message}")]
    InvalidEvent {
        /// Detailed error message.
        message: String,
    },

    /// Loop whose body never advances time.
    #[error("infinite loop -- {channel}{frame}")]
    InfiniteLoop {
        /// Channel tag.
        channel: char,
        /// Loop frame description.
        frame: String,
    },

    /// No channel of the song lasts any tick.
    #[error("empty song\n>> {song}")]
    EmptySong {
        /// Song summary.
        song: String,
    },

    /// Second undecodable record in one channel.
    #[error("{channel}[{offset}/{size}] {source}")]
    SequenceCorrupt {
        /// Channel tag.
        channel: char,
        /// Record offset in the song buffer.
        offset: usize,
        /// Song buffer size.
        size: usize,
        /// Decode failure of the second bad record.
        source: Box<QuartetError>,
    },

    /// Instrument discovery did not converge within its pass budget.
    #[error("instrument discovery did not converge after {passes} passes")]
    DiscoveryDiverged {
        /// Number of passes executed.
        passes: usize,
    },

    /// Input is compressed with the ICE! packer.
    #[error("input is ICE! packed")]
    Packed,
}

impl QuartetError {
    /// Create a format error.
    pub fn format(structure: Structure, message: impl Into<String>) -> Self {
        Self::Format {
            structure,
            message: message.into(),
            offset: None,
        }
    }

    /// Create a format error at a specific offset.
    pub fn format_at(structure: Structure, message: impl Into<String>, offset: usize) -> Self {
        Self::Format {
            structure,
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Create an invalid-event error.
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Structure this error belongs to.
    pub fn structure(&self) -> Structure {
        match self {
            Self::Format { structure, .. } => *structure,
            Self::Overlap { .. } | Self::DiscoveryDiverged { .. } => Structure::InstrumentSet,
            Self::SampleHeader { .. } => Structure::SampleHeader,
            Self::TempoMismatch { .. }
            | Self::NoVoice { .. }
            | Self::VoiceOutOfRange { .. }
            | Self::InfiniteLoop { .. }
            | Self::SequenceCorrupt { .. } => Structure::Channel,
            Self::UnknownCommand { .. } | Self::InvalidEvent { .. } => Structure::Sequence,
            Self::EmptySong { .. } => Structure::Song,
            Self::Packed => Structure::Container,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Format { .. } => "QUARTET_001",
            Self::Overlap { .. } => "QUARTET_002",
            Self::SampleHeader { .. } => "QUARTET_003",
            Self::TempoMismatch { .. } => "QUARTET_004",
            Self::NoVoice { .. } => "QUARTET_005",
            Self::VoiceOutOfRange { .. } => "QUARTET_006",
            Self::UnknownCommand { .. } => "QUARTET_007",
            Self::InvalidEvent { .. } => "QUARTET_008",
            Self::InfiniteLoop { .. } => "QUARTET_009",
            Self::EmptySong { .. } => "QUARTET_010",
            Self::SequenceCorrupt { .. } => "QUARTET_011",
            Self::DiscoveryDiverged { .. } => "QUARTET_012",
            Self::Packed => "QUARTET_013",
        }
    }

    /// Byte offset carried by the error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Format { offset, .. } => *offset,
            Self::SequenceCorrupt { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = QuartetError::format(Structure::InstrumentSet, "sampling rate out of range -- 3");
        assert_eq!(
            err.to_string(),
            "instrument set: sampling rate out of range -- 3"
        );
        assert_eq!(err.code(), "QUARTET_001");
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_structure_mapping() {
        let err = QuartetError::NoVoice {
            channel: 'A',
            event: "[00000] P".to_string(),
        };
        assert_eq!(err.structure(), Structure::Channel);
        assert_eq!(QuartetError::Packed.structure(), Structure::Container);
        assert_eq!(
            QuartetError::DiscoveryDiverged { passes: 21 }.structure(),
            Structure::InstrumentSet
        );
    }

    #[test]
    fn test_sequence_corrupt_wraps_source() {
        let err = QuartetError::SequenceCorrupt {
            channel: 'B',
            offset: 40,
            size: 100,
            source: Box::new(QuartetError::invalid_event("Invalid \"R\"est length -- 0000")),
        };
        assert_eq!(err.to_string(), "B[40/100] Invalid \"R\"est length -- 0000");
        assert_eq!(err.offset(), Some(40));
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            QuartetError::format(Structure::Song, "x"),
            QuartetError::SampleHeader { message: "x".into() },
            QuartetError::UnknownCommand { code: 0x5A, printable: 'Z' },
            QuartetError::invalid_event("x"),
            QuartetError::EmptySong { song: "x".into() },
            QuartetError::Packed,
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
